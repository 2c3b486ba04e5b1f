// =============================================================================
// AKISMET CLIENT - comment-check API integration
// =============================================================================
//
// Implements `SpamClassifier` against Akismet (https://akismet.com/developers/).
//
// **Wire format:**
// - POST `application/x-www-form-urlencoded` to `/1.1/comment-check`
// - Body `false` = ham, `true` = spam
// - Header `X-akismet-pro-tip: discard` on a `true` means blatant spam
// - Body `invalid` means the API key was rejected
//
// **Environment Variables:**
// - `AKISMET_API_KEY` - read by `SpamSettings`, passed in per call

use crate::core::moderation::{SpamCheckRequest, SpamClassifier, SpamServiceError, SpamVerdict};
use async_trait::async_trait;
use reqwest::Client;

const DEFAULT_BASE_URL: &str = "https://rest.akismet.com";

pub struct AkismetClient {
    client: Client,
    base_url: String,
}

impl AkismetClient {
    pub fn new() -> Result<Self, SpamServiceError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at another host (a proxy, or a mock server in tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, SpamServiceError> {
        let client = Client::builder()
            .user_agent(format!("comment-moderation/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SpamServiceError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn form_fields(
        credential: &str,
        blog_url: &str,
        request: &SpamCheckRequest,
        is_test: bool,
    ) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("api_key", credential.to_string()),
            ("blog", blog_url.to_string()),
            ("permalink", request.permalink.clone()),
            ("comment_type", request.comment_type.to_string()),
            ("comment_author", request.comment_author.clone()),
            ("comment_author_email", request.comment_author_email.clone()),
            ("comment_author_url", request.comment_author_url.clone()),
            ("comment_content", request.comment_content.clone()),
            ("comment_date_gmt", request.comment_date.to_rfc3339()),
            ("referrer", request.referrer.clone()),
            ("user_agent", request.user_agent.clone()),
            ("user_ip", request.user_ip.clone()),
            ("is_test", if is_test { "1" } else { "0" }.to_string()),
        ];

        if let Some(role) = request.user_role {
            fields.push(("user_role", role.to_string()));
        }
        if let Some(lang) = &request.blog_lang {
            fields.push(("blog_lang", lang.clone()));
        }

        fields
    }

    fn parse_verdict(
        body: &str,
        pro_tip: Option<&str>,
        debug_help: Option<&str>,
    ) -> Result<SpamVerdict, SpamServiceError> {
        match body.trim() {
            "false" => Ok(SpamVerdict::None),
            "true" if pro_tip == Some("discard") => Ok(SpamVerdict::DefiniteSpam),
            "true" => Ok(SpamVerdict::ProbableSpam),
            "invalid" => Err(SpamServiceError::InvalidCredential),
            other => Err(SpamServiceError::MalformedResponse(match debug_help {
                Some(help) => format!("{:?} ({})", other, help),
                None => format!("{:?}", other),
            })),
        }
    }
}

#[async_trait]
impl SpamClassifier for AkismetClient {
    async fn check(
        &self,
        credential: &str,
        blog_url: &str,
        request: &SpamCheckRequest,
        is_test: bool,
    ) -> Result<SpamVerdict, SpamServiceError> {
        let url = format!("{}/1.1/comment-check", self.base_url);

        let response = self
            .client
            .post(&url)
            .form(&Self::form_fields(credential, blog_url, request, is_test))
            .send()
            .await
            .map_err(|e| SpamServiceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpamServiceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let pro_tip = header("x-akismet-pro-tip");
        let debug_help = header("x-akismet-debug-help");

        let body = response
            .text()
            .await
            .map_err(|e| SpamServiceError::Transport(e.to_string()))?;

        Self::parse_verdict(&body, pro_tip.as_deref(), debug_help.as_deref())
    }
}

// =============================================================================
// TESTS
// =============================================================================
