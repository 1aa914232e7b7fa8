//! Purpose: Decode the platform's single-tweet GraphQL response into a `Tweet`.
//! Exports: `parse_tweet_response`.
//! Role: Pure response mapping, kept apart from transport so it can be tested offline.
//! Invariants: Tombstones, unavailable results and "no status found" errors map to `Ok(None)`.
//! Invariants: Photos resolve to original quality; videos and gifs to the best mp4 variant.
//! Notes: Author names are read from `core` first and `legacy` second (both shapes are live).

use crate::core::error::{Error, ErrorKind};
use crate::core::tweet::Tweet;
use crate::json::parse;
use serde::Deserialize;
use url::Url;

/// Platform error code for a status id that does not exist.
const NO_STATUS_FOUND: i64 = 144;

#[derive(Debug, Deserialize)]
struct TweetResultResponse {
    #[serde(default)]
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "tweetResult", default)]
    tweet_result: Option<ResultSlot>,
}

#[derive(Debug, Deserialize)]
struct ResultSlot {
    #[serde(default)]
    result: Option<TweetResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum TweetResult {
    Tweet(RawTweet),
    TweetWithVisibilityResults {
        tweet: RawTweet,
    },
    #[serde(other)]
    Unavailable,
}

#[derive(Debug, Deserialize)]
struct RawTweet {
    rest_id: String,
    #[serde(default)]
    core: Option<TweetCore>,
    #[serde(default)]
    legacy: Option<TweetLegacy>,
}

#[derive(Debug, Deserialize)]
struct TweetCore {
    user_results: UserResults,
}

#[derive(Debug, Deserialize)]
struct UserResults {
    #[serde(default)]
    result: Option<RawUser>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUser {
    #[serde(default)]
    core: Option<UserNames>,
    #[serde(default)]
    legacy: Option<UserNames>,
}

#[derive(Debug, Default, Deserialize)]
struct UserNames {
    #[serde(default)]
    name: String,
    #[serde(default)]
    screen_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct TweetLegacy {
    #[serde(default)]
    full_text: String,
    #[serde(default)]
    possibly_sensitive: bool,
    #[serde(default)]
    extended_entities: Option<ExtendedEntities>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtendedEntities {
    #[serde(default)]
    media: Vec<RawMedia>,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    #[serde(rename = "type")]
    kind: MediaKind,
    #[serde(default)]
    media_url_https: String,
    #[serde(default)]
    video_info: Option<VideoInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MediaKind {
    Photo,
    Video,
    AnimatedGif,
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    variants: Vec<MediaVariant>,
}

#[derive(Debug, Deserialize)]
struct MediaVariant {
    #[serde(default)]
    bitrate: Option<u64>,
    #[serde(default)]
    content_type: String,
    url: String,
}

pub(crate) fn parse_tweet_response(body: &str) -> Result<Option<Tweet>, Error> {
    let response: TweetResultResponse = parse::from_str(body).map_err(|err| {
        Error::new(ErrorKind::Upstream)
            .with_message("invalid tweet response json")
            .with_source(err)
    })?;

    let result = response
        .data
        .and_then(|data| data.tweet_result)
        .and_then(|slot| slot.result);

    match result {
        Some(TweetResult::Tweet(raw))
        | Some(TweetResult::TweetWithVisibilityResults { tweet: raw }) => {
            Ok(Some(tweet_from_raw(raw)))
        }
        Some(TweetResult::Unavailable) => Ok(None),
        None => match classify_errors(response.errors) {
            PlatformErrors::Failed(err) => Err(err),
            PlatformErrors::Empty | PlatformErrors::NotFound(_) => Ok(None),
        },
    }
}

/// What the platform's `errors` array says about a request.
#[derive(Debug)]
pub(crate) enum PlatformErrors {
    Empty,
    /// "No status found"; carries the platform's message.
    NotFound(String),
    Failed(Error),
}

pub(crate) fn classify_errors(errors: Vec<ApiError>) -> PlatformErrors {
    if let Some(missing) = errors
        .iter()
        .find(|err| err.code == Some(NO_STATUS_FOUND) || err.message.contains("No status found"))
    {
        return PlatformErrors::NotFound(missing.message.clone());
    }
    let Some(first) = errors.into_iter().next() else {
        return PlatformErrors::Empty;
    };
    let message = match first.code {
        Some(code) => format!("{} ({code})", first.message),
        None => first.message,
    };
    PlatformErrors::Failed(Error::upstream(message))
}

fn tweet_from_raw(raw: RawTweet) -> Tweet {
    let user = raw
        .core
        .and_then(|core| core.user_results.result)
        .unwrap_or_default();
    let (name, username) = user_names(user);
    let legacy = raw.legacy.unwrap_or_default();

    let mut tweet = Tweet {
        permanent_url: format!("https://x.com/{username}/status/{}", raw.rest_id),
        id: raw.rest_id,
        text: legacy.full_text,
        name,
        username,
        sensitive_content: legacy.possibly_sensitive,
        ..Tweet::default()
    };

    let media = legacy
        .extended_entities
        .map(|entities| entities.media)
        .unwrap_or_default();
    for item in media {
        match item.kind {
            MediaKind::Photo => match original_photo_url(&item.media_url_https) {
                Some(url) => tweet.photos.push(url),
                None => tracing::warn!(tweet_id = %tweet.id, "photo without a usable url"),
            },
            MediaKind::Video => match best_mp4_url(&item) {
                Some(url) => tweet.videos.push(url),
                None => tracing::warn!(tweet_id = %tweet.id, "video without an mp4 variant"),
            },
            MediaKind::AnimatedGif => match best_mp4_url(&item) {
                Some(url) => tweet.gifs.push(url),
                None => tracing::warn!(tweet_id = %tweet.id, "gif without an mp4 variant"),
            },
            MediaKind::Other => {}
        }
    }
    tweet
}

fn user_names(user: RawUser) -> (String, String) {
    let core = user.core.unwrap_or_default();
    let legacy = user.legacy.unwrap_or_default();
    let name = if core.name.is_empty() {
        legacy.name
    } else {
        core.name
    };
    let username = if core.screen_name.is_empty() {
        legacy.screen_name
    } else {
        core.screen_name
    };
    (name, username)
}

fn original_photo_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "name")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("name", "orig");
    Some(url.to_string())
}

fn best_mp4_url(media: &RawMedia) -> Option<String> {
    media
        .video_info
        .as_ref()?
        .variants
        .iter()
        .filter(|variant| variant.content_type == "video/mp4")
        .max_by_key(|variant| variant.bitrate.unwrap_or(0))
        .map(|variant| variant.url.clone())
}
