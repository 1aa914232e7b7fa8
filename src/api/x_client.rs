//! Purpose: `Scraper` implementation that talks to the platform's web endpoints.
//! Exports: `XClient`.
//! Role: The client the C ABI installs into its process-wide session.
//! Invariants: Anonymous lookups carry a guest token; cookie sessions carry `ct0` as CSRF token.
//! Invariants: A guest token dropped after a rejection is reactivated on the next lookup.
//! Invariants: A 404 or "no status found" answer is `Ok(None)`, never an error.
//! Notes: No retry or backoff here; one call is one request.
#![allow(clippy::result_large_err)]

use crate::api::transport::{API_BASE, Transport, direct_agent, proxied_agent};
use crate::api::tweet_result::parse_tweet_response;
use crate::core::cookie::CookieRecord;
use crate::core::error::{Error, ErrorKind};
use crate::core::scraper::Scraper;
use crate::core::tweet::Tweet;
use serde_json::{Value, json};
use url::Url;

const TWEET_RESULT_BY_REST_ID: &str = "graphql/Vg2Akr5FzUmF0sTplA5k6g/TweetResultByRestId";
const VERIFY_CREDENTIALS: &str = "1.1/account/verify_credentials.json";

pub struct XClient {
    transport: Transport,
    open_account: bool,
}

impl XClient {
    pub fn new() -> Self {
        Self {
            transport: Transport::new(direct_agent()),
            open_account: false,
        }
    }

    /// Anonymous sessions and sessions without a user cookie ride on a guest token.
    fn needs_guest_token(&self) -> bool {
        self.open_account || !self.transport.has_cookie("auth_token")
    }

    fn tweet_url(id: &str) -> Result<Url, Error> {
        let variables = json!({
            "tweetId": id,
            "withCommunity": false,
            "includePromotedContent": false,
            "withVoice": false,
        });
        let field_toggles = json!({
            "withArticleRichContentState": false,
            "withArticlePlainText": false,
        });
        Url::parse_with_params(
            &format!("{API_BASE}/{TWEET_RESULT_BY_REST_ID}"),
            &[
                ("variables", variables.to_string()),
                ("features", tweet_features().to_string()),
                ("fieldToggles", field_toggles.to_string()),
            ],
        )
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to build tweet url")
                .with_source(err)
        })
    }
}

impl Default for XClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Scraper for XClient {
    fn set_proxy(&mut self, proxy: &str) -> Result<(), Error> {
        self.transport.set_agent(proxied_agent(proxy)?);
        Ok(())
    }

    fn login_open_account(&mut self) -> Result<(), Error> {
        self.transport.activate_guest_token()?;
        self.open_account = true;
        Ok(())
    }

    fn set_cookies(&mut self, cookies: &[CookieRecord]) {
        self.transport.replace_cookies(cookies);
    }

    fn is_logged_in(&mut self) -> bool {
        if !self.transport.has_cookie("auth_token") {
            return false;
        }
        let url = format!("{API_BASE}/{VERIFY_CREDENTIALS}");
        match self.transport.send_json::<Value>("GET", &url, None) {
            Ok(body) => body
                .get("errors")
                .and_then(Value::as_array)
                .is_none_or(|errors| errors.is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "credential check request failed");
                false
            }
        }
    }

    fn get_tweet(&mut self, id: &str) -> Result<Option<Tweet>, Error> {
        if self.needs_guest_token() && self.transport.guest_token().is_none() {
            tracing::debug!("activating guest token before lookup");
            self.transport.activate_guest_token()?;
        }
        let url = Self::tweet_url(id)?;
        let body = match self.transport.send("GET", url.as_str(), None) {
            Ok(body) => body,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        parse_tweet_response(&body)
    }
}

fn tweet_features() -> Value {
    json!({
        "creator_subscriptions_tweet_preview_api_enabled": true,
        "communities_web_enable_tweet_community_results_fetch": true,
        "c9s_tweet_anatomy_moderator_badge_enabled": true,
        "articles_preview_enabled": true,
        "responsive_web_edit_tweet_api_enabled": true,
        "graphql_is_translatable_rweb_tweet_is_translatable_enabled": true,
        "view_counts_everywhere_api_enabled": true,
        "longform_notetweets_consumption_enabled": true,
        "responsive_web_twitter_article_tweet_consumption_enabled": true,
        "tweet_awards_web_tipping_enabled": false,
        "creator_subscriptions_quote_tweet_preview_enabled": false,
        "freedom_of_speech_not_reach_fetch_enabled": true,
        "standardized_nudges_misinfo": true,
        "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled": true,
        "rweb_video_timestamps_enabled": true,
        "longform_notetweets_rich_text_read_enabled": true,
        "longform_notetweets_inline_media_enabled": true,
        "rweb_tipjar_consumption_enabled": true,
        "responsive_web_graphql_exclude_directive_enabled": true,
        "verified_phone_label_enabled": false,
        "responsive_web_graphql_skip_user_profile_image_extensions_enabled": false,
        "responsive_web_graphql_timeline_navigation_enabled": true,
        "responsive_web_enhance_cards_enabled": false,
    })
}

#[cfg(test)]
mod tests {
    use super::XClient;
    use crate::core::cookie::CookieRecord;
    use crate::core::error::ErrorKind;
    use crate::core::scraper::Scraper;
    use serde_json::Value;

    #[test]
    fn tweet_url_encodes_id_in_variables() {
        let url = XClient::tweet_url("1607191066318454791").expect("url");
        assert!(url.path().ends_with("/TweetResultByRestId"));
        let variables = url
            .query_pairs()
            .find(|(key, _)| key == "variables")
            .map(|(_, value)| value.into_owned())
            .expect("variables");
        let variables: Value = serde_json::from_str(&variables).expect("json");
        assert_eq!(variables["tweetId"], "1607191066318454791");
    }

    #[test]
    fn bad_proxy_is_rejected_before_any_request() {
        let mut client = XClient::new();
        let err = client.set_proxy("ftp://127.0.0.1:21").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn credential_check_needs_auth_token() {
        let mut client = XClient::new();
        client.set_cookies(&[CookieRecord::new("ct0", "xyz")]);
        assert!(!client.is_logged_in());
        assert!(client.needs_guest_token());
    }

    #[test]
    fn user_cookie_session_skips_guest_token() {
        let mut client = XClient::new();
        client.set_cookies(&[CookieRecord::new("auth_token", "abc")]);
        assert!(!client.needs_guest_token());
        client.open_account = true;
        assert!(client.needs_guest_token());
    }
}
