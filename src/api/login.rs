//! Purpose: Username/password/2FA login against the platform's onboarding flow.
//! Exports: `LoginCredentials`, `LoginPrompt`, `login`.
//! Role: Backs the offline `x-login` utility; never used by the C ABI.
//! Invariants: Each flow step answers exactly the first pending subtask.
//! Invariants: Interactive input is requested only when a subtask needs it.
//! Invariants: Success means the jar holds an `auth_token` cookie at the end of the flow.
#![allow(clippy::result_large_err)]

use crate::api::transport::{API_BASE, Transport, direct_agent, proxied_agent};
use crate::core::cookie::CookieRecord;
use crate::core::error::{Error, ErrorKind};
use serde::Deserialize;
use serde_json::{Value, json};

const TASK_URL: &str = "1.1/onboarding/task.json";
const MAX_FLOW_STEPS: usize = 16;

#[derive(Clone, Debug)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
    /// Email or phone used when the platform asks to confirm the account.
    pub email: Option<String>,
}

/// Source of answers the platform may ask for mid-flow.
pub trait LoginPrompt {
    fn two_factor_code(&mut self) -> Result<String, Error>;
    fn alternate_identifier(&mut self, hint: &str) -> Result<String, Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Subtask {
    JsInstrumentation,
    EnterUserIdentifier,
    EnterPassword,
    Acid,
    AccountDuplicationCheck,
    TwoFactorChallenge,
    EnterAlternateIdentifier,
    Success,
    Deny,
    Unknown(String),
}

impl From<&str> for Subtask {
    fn from(id: &str) -> Self {
        match id {
            "LoginJsInstrumentationSubtask" => Self::JsInstrumentation,
            "LoginEnterUserIdentifierSSO" => Self::EnterUserIdentifier,
            "LoginEnterPassword" => Self::EnterPassword,
            "LoginAcid" => Self::Acid,
            "AccountDuplicationCheck" => Self::AccountDuplicationCheck,
            "LoginTwoFactorAuthChallenge" => Self::TwoFactorChallenge,
            "LoginEnterAlternateIdentifierSubtask" => Self::EnterAlternateIdentifier,
            "LoginSuccessSubtask" => Self::Success,
            "DenyLoginSubtask" => Self::Deny,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FlowResponse {
    flow_token: String,
    #[serde(default)]
    subtasks: Vec<FlowSubtask>,
}

#[derive(Debug, Deserialize)]
struct FlowSubtask {
    subtask_id: String,
}

pub fn login(
    credentials: &LoginCredentials,
    prompt: &mut dyn LoginPrompt,
    proxy: Option<&str>,
) -> Result<Vec<CookieRecord>, Error> {
    let agent = match proxy {
        Some(proxy) => proxied_agent(proxy)?,
        None => direct_agent(),
    };
    let mut transport = Transport::new(agent);
    transport.activate_guest_token()?;

    let init = json!({
        "input_flow_data": {
            "flow_context": {
                "debug_overrides": {},
                "start_location": { "location": "unknown" }
            }
        },
        "subtask_versions": {}
    });
    let mut flow: FlowResponse = transport.send_json(
        "POST",
        &format!("{API_BASE}/{TASK_URL}?flow_name=login"),
        Some(&init),
    )?;

    for _ in 0..MAX_FLOW_STEPS {
        let Some(next) = flow.subtasks.first() else {
            break;
        };
        let subtask = Subtask::from(next.subtask_id.as_str());
        tracing::debug!(subtask = %next.subtask_id, "login subtask");
        let Some(input) = subtask_input(&subtask, credentials, prompt)? else {
            break;
        };
        let request = json!({
            "flow_token": flow.flow_token,
            "subtask_inputs": [input],
        });
        flow = transport.send_json("POST", &format!("{API_BASE}/{TASK_URL}"), Some(&request))?;
    }

    if !transport.has_cookie("auth_token") {
        return Err(Error::new(ErrorKind::AuthenticationFailed)
            .with_message("login flow finished without a session cookie"));
    }
    tracing::info!("login succeeded");
    Ok(transport.cookie_records())
}

/// Builds the answer for one subtask; `None` ends the flow.
fn subtask_input(
    subtask: &Subtask,
    credentials: &LoginCredentials,
    prompt: &mut dyn LoginPrompt,
) -> Result<Option<Value>, Error> {
    let input = match subtask {
        Subtask::JsInstrumentation => json!({
            "subtask_id": "LoginJsInstrumentationSubtask",
            "js_instrumentation": { "response": "{}", "link": "next_link" }
        }),
        Subtask::EnterUserIdentifier => json!({
            "subtask_id": "LoginEnterUserIdentifierSSO",
            "settings_list": {
                "setting_responses": [{
                    "key": "user_identifier",
                    "response_data": { "text_data": { "result": credentials.username } }
                }],
                "link": "next_link"
            }
        }),
        Subtask::EnterPassword => json!({
            "subtask_id": "LoginEnterPassword",
            "enter_password": { "password": credentials.password, "link": "next_link" }
        }),
        Subtask::Acid => {
            let answer = match &credentials.email {
                Some(email) => email.clone(),
                None => prompt.alternate_identifier("confirmation code or email")?,
            };
            json!({
                "subtask_id": "LoginAcid",
                "enter_text": { "text": answer, "link": "next_link" }
            })
        }
        Subtask::AccountDuplicationCheck => json!({
            "subtask_id": "AccountDuplicationCheck",
            "check_logged_in_account": { "link": "AccountDuplicationCheck_false" }
        }),
        Subtask::TwoFactorChallenge => {
            let code = prompt.two_factor_code()?;
            json!({
                "subtask_id": "LoginTwoFactorAuthChallenge",
                "enter_text": { "text": code.trim(), "link": "next_link" }
            })
        }
        Subtask::EnterAlternateIdentifier => {
            let answer = match &credentials.email {
                Some(email) => email.clone(),
                None => prompt.alternate_identifier("email or phone number")?,
            };
            json!({
                "subtask_id": "LoginEnterAlternateIdentifierSubtask",
                "enter_text": { "text": answer, "link": "next_link" }
            })
        }
        Subtask::Success => return Ok(None),
        Subtask::Deny => {
            return Err(Error::new(ErrorKind::AuthenticationFailed).with_message("login denied"));
        }
        Subtask::Unknown(id) => {
            return Err(Error::upstream(format!("unhandled login subtask {id}")));
        }
    };
    Ok(Some(input))
}

#[cfg(test)]
mod tests {
    use super::{LoginCredentials, LoginPrompt, Subtask, subtask_input};
    use crate::core::error::{Error, ErrorKind};

    #[derive(Default)]
    struct Scripted {
        codes: Vec<String>,
        identifiers: Vec<String>,
        asked: usize,
    }

    impl LoginPrompt for Scripted {
        fn two_factor_code(&mut self) -> Result<String, Error> {
            self.asked += 1;
            self.codes
                .pop()
                .ok_or_else(|| Error::new(ErrorKind::InvalidInput).with_message("no code"))
        }

        fn alternate_identifier(&mut self, _hint: &str) -> Result<String, Error> {
            self.asked += 1;
            self.identifiers
                .pop()
                .ok_or_else(|| Error::new(ErrorKind::InvalidInput).with_message("no identifier"))
        }
    }

    fn credentials(email: Option<&str>) -> LoginCredentials {
        LoginCredentials {
            username: "someone".to_string(),
            password: "hunter2".to_string(),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn subtask_ids_map_to_known_steps() {
        assert_eq!(Subtask::from("LoginEnterPassword"), Subtask::EnterPassword);
        assert_eq!(
            Subtask::from("LoginTwoFactorAuthChallenge"),
            Subtask::TwoFactorChallenge
        );
        assert_eq!(
            Subtask::from("SomethingNew"),
            Subtask::Unknown("SomethingNew".to_string())
        );
    }

    #[test]
    fn username_and_password_use_credentials_without_prompting() {
        let mut prompt = Scripted::default();
        let creds = credentials(None);
        let user = subtask_input(&Subtask::EnterUserIdentifier, &creds, &mut prompt)
            .expect("input")
            .expect("some");
        assert_eq!(
            user["settings_list"]["setting_responses"][0]["response_data"]["text_data"]["result"],
            "someone"
        );
        let password = subtask_input(&Subtask::EnterPassword, &creds, &mut prompt)
            .expect("input")
            .expect("some");
        assert_eq!(password["enter_password"]["password"], "hunter2");
        assert_eq!(prompt.asked, 0);
    }

    #[test]
    fn two_factor_prompts_and_trims_code() {
        let mut prompt = Scripted {
            codes: vec![" 123456\n".to_string()],
            ..Scripted::default()
        };
        let input = subtask_input(&Subtask::TwoFactorChallenge, &credentials(None), &mut prompt)
            .expect("input")
            .expect("some");
        assert_eq!(input["subtask_id"], "LoginTwoFactorAuthChallenge");
        assert_eq!(input["enter_text"]["text"], "123456");
        assert_eq!(prompt.asked, 1);
    }

    #[test]
    fn alternate_identifier_prefers_flag_over_prompt() {
        let mut prompt = Scripted::default();
        let input = subtask_input(
            &Subtask::EnterAlternateIdentifier,
            &credentials(Some("me@example.com")),
            &mut prompt,
        )
        .expect("input")
        .expect("some");
        assert_eq!(input["enter_text"]["text"], "me@example.com");
        assert_eq!(prompt.asked, 0);

        let mut prompt = Scripted {
            identifiers: vec!["+15550100".to_string()],
            ..Scripted::default()
        };
        let input = subtask_input(&Subtask::Acid, &credentials(None), &mut prompt)
            .expect("input")
            .expect("some");
        assert_eq!(input["enter_text"]["text"], "+15550100");
    }

    #[test]
    fn success_ends_flow_and_deny_fails() {
        let mut prompt = Scripted::default();
        let creds = credentials(None);
        assert!(subtask_input(&Subtask::Success, &creds, &mut prompt)
            .expect("input")
            .is_none());
        let err = subtask_input(&Subtask::Deny, &creds, &mut prompt).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        let err = subtask_input(&Subtask::Unknown("X".to_string()), &creds, &mut prompt)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }
}
