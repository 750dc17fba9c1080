//! Live MTA-STS policy resolver.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{Resolver, TokioResolver};
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client as HttpClient, StatusCode};
use sts_hints_core::{DomainName, Policy, PolicyResolution, PolicyResolver};
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::{ResolverError, ResolverResult};
use crate::parse::{parse_policy, select_record};

/// Resolves MTA-STS policies over DNS and HTTPS
#[derive(Clone)]
pub struct StsResolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    dns: TokioResolver,
    http: HttpClient,
    fetch: FetchConfig,
}

impl StsResolver {
    /// Create a resolver using the system DNS configuration
    pub fn new() -> ResolverResult<Self> {
        StsResolverBuilder::new().build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> StsResolverBuilder {
        StsResolverBuilder::new()
    }

    /// Fetch configuration in use
    #[must_use]
    pub fn fetch_config(&self) -> &FetchConfig {
        &self.inner.fetch
    }

    /// Look up the TXT strings published at `_mta-sts.<domain>`.
    ///
    /// Returns an empty list when the name does not exist or has no TXT
    /// records.
    pub async fn lookup_txt(&self, domain: &str) -> ResolverResult<Vec<String>> {
        let name = format!("_mta-sts.{domain}.");
        debug!(name = %name, "querying MTA-STS record");

        match self.inner.dns.txt_lookup(name.as_str()).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|txt| {
                    txt.txt_data()
                        .iter()
                        .map(|data| String::from_utf8_lossy(data))
                        .collect::<String>()
                })
                .collect()),
            Err(e) if e.is_no_records_found() || e.is_nx_domain() => {
                debug!(name = %name, "no MTA-STS record");
                Ok(Vec::new())
            }
            Err(e) => Err(ResolverError::Dns(e.to_string())),
        }
    }

    /// Resolve a domain given the TXT strings already fetched for it
    pub async fn resolve_from_txt(&self, domain: &str, txts: &[String]) -> PolicyResolution {
        let record = match select_record(txts) {
            Ok(Some(record)) => record,
            Ok(None) => return PolicyResolution::NoneConfigured,
            Err(e) => {
                debug!(domain, error = %e, "unusable MTA-STS record");
                return e.into();
            }
        };

        match self.fetch_policy(domain, record.id).await {
            Ok(policy) => {
                debug!(domain, mode = %policy.mode, max_age = policy.max_age, "fetched policy");
                PolicyResolution::Valid(policy)
            }
            Err(e) => {
                if e.is_transient() {
                    warn!(domain, error = %e, "policy fetch failed");
                } else {
                    debug!(domain, error = %e, "policy rejected");
                }
                e.into()
            }
        }
    }

    /// Download and parse the policy file of `domain`
    pub async fn fetch_policy(&self, domain: &str, id: String) -> ResolverResult<Policy> {
        let url = self.inner.fetch.policy_url(domain);
        debug!(url = %url, "GET policy");

        let mut response = self.inner.http.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ResolverError::PolicyNotFound);
        }
        if !status.is_success() {
            return Err(ResolverError::PolicyStatus(status.as_u16()));
        }

        let is_text = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("text/plain"));
        if !is_text {
            return Err(ResolverError::InvalidPolicy(
                "policy must be served as text/plain".into(),
            ));
        }

        let limit = self.inner.fetch.max_policy_size;
        let too_large =
            || ResolverError::InvalidPolicy(format!("policy larger than {limit} bytes"));

        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        let text = std::str::from_utf8(&body)
            .map_err(|e| ResolverError::InvalidPolicy(e.to_string()))?;
        parse_policy(text, id)
    }
}

#[async_trait]
impl PolicyResolver for StsResolver {
    async fn resolve(&self, domain: &DomainName) -> PolicyResolution {
        match self.lookup_txt(domain.as_str()).await {
            Ok(txts) => self.resolve_from_txt(domain.as_str(), &txts).await,
            Err(e) => {
                warn!(domain = %domain, error = %e, "MTA-STS record lookup failed");
                e.into()
            }
        }
    }
}

/// Builder for configuring a [`StsResolver`]
pub struct StsResolverBuilder {
    fetch: FetchConfig,
    dns: Option<TokioResolver>,
}

impl Default for StsResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StsResolverBuilder {
    /// Create a builder with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            fetch: FetchConfig::default(),
            dns: None,
        }
    }

    /// Replace the whole fetch configuration
    #[must_use]
    pub fn fetch_config(mut self, config: FetchConfig) -> Self {
        self.fetch = config;
        self
    }

    /// Set the policy fetch timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.fetch = self.fetch.timeout(timeout);
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.fetch = self.fetch.user_agent(agent);
        self
    }

    /// Override the policy host (useful for testing)
    #[must_use]
    pub fn policy_base_url(mut self, url: impl Into<String>) -> Self {
        self.fetch = self.fetch.policy_base_url(url);
        self
    }

    /// Use a preconfigured DNS resolver
    #[must_use]
    pub fn dns(mut self, resolver: TokioResolver) -> Self {
        self.dns = Some(resolver);
        self
    }

    /// Build the resolver
    pub fn build(self) -> ResolverResult<StsResolver> {
        let http = HttpClient::builder()
            .timeout(self.fetch.timeout)
            .user_agent(&self.fetch.user_agent)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ResolverError::Config(format!("failed to build HTTP client: {e}")))?;

        let dns = match self.dns {
            Some(dns) => dns,
            None => system_resolver(),
        };

        Ok(StsResolver {
            inner: Arc::new(ResolverInner {
                dns,
                http,
                fetch: self.fetch,
            }),
        })
    }
}

/// The system resolver, or public resolvers if the system configuration is unreadable
fn system_resolver() -> TokioResolver {
    match TokioResolver::builder_tokio() {
        Ok(builder) => builder.build(),
        Err(e) => {
            warn!(error = %e, "system DNS configuration unavailable, using public resolvers");
            Resolver::builder_with_config(
                ResolverConfig::cloudflare(),
                TokioConnectionProvider::default(),
            )
            .build()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sts_hints_core::Mode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENFORCE_POLICY: &str =
        "version: STSv1\nmode: enforce\nmx: mx1.example.com\nmax_age: 1209600\n";

    async fn serve(template: ResponseTemplate) -> (MockServer, StsResolver) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/mta-sts.txt"))
            .respond_with(template)
            .mount(&server)
            .await;
        let resolver = StsResolver::builder()
            .policy_base_url(server.uri())
            .build()
            .unwrap();
        (server, resolver)
    }

    fn record() -> Vec<String> {
        vec!["v=STSv1; id=20240101T000000".to_string()]
    }

    #[tokio::test]
    async fn fetches_valid_policy() {
        let (_server, resolver) =
            serve(ResponseTemplate::new(200).set_body_raw(ENFORCE_POLICY, "text/plain")).await;

        let resolution = resolver.resolve_from_txt("example.com", &record()).await;
        let policy = resolution.policy().expect("valid policy");
        assert_eq!(policy.mode, Mode::Enforce);
        assert_eq!(policy.max_age, 1_209_600);
        assert_eq!(policy.id, "20240101T000000");
    }

    #[tokio::test]
    async fn accepts_charset_parameter() {
        let (_server, resolver) = serve(
            ResponseTemplate::new(200).set_body_raw(ENFORCE_POLICY, "text/plain; charset=utf-8"),
        )
        .await;
        assert!(resolver.fetch_policy("example.com", "1".into()).await.is_ok());
    }

    #[tokio::test]
    async fn missing_policy_is_not_found() {
        let (_server, resolver) = serve(ResponseTemplate::new(404)).await;
        assert_eq!(
            resolver.resolve_from_txt("example.com", &record()).await,
            PolicyResolution::NotFound
        );
    }

    #[tokio::test]
    async fn server_error_is_fetch_error() {
        let (_server, resolver) = serve(ResponseTemplate::new(503)).await;
        assert!(resolver
            .resolve_from_txt("example.com", &record())
            .await
            .is_transient());
    }

    #[tokio::test]
    async fn redirects_are_not_followed() {
        let (_server, resolver) = serve(
            ResponseTemplate::new(302).insert_header("Location", "https://elsewhere.example/"),
        )
        .await;
        assert!(matches!(
            resolver.fetch_policy("example.com", "1".into()).await,
            Err(ResolverError::PolicyStatus(302))
        ));
    }

    #[tokio::test]
    async fn wrong_content_type_is_invalid() {
        let (_server, resolver) =
            serve(ResponseTemplate::new(200).set_body_raw(ENFORCE_POLICY, "text/html")).await;
        assert!(matches!(
            resolver.resolve_from_txt("example.com", &record()).await,
            PolicyResolution::Invalid { .. }
        ));
    }

    #[tokio::test]
    async fn oversized_policy_is_invalid() {
        let body = format!("{ENFORCE_POLICY}{}", "x: y\n".repeat(20_000));
        let (_server, resolver) =
            serve(ResponseTemplate::new(200).set_body_raw(body, "text/plain")).await;
        assert!(matches!(
            resolver.fetch_policy("example.com", "1".into()).await,
            Err(ResolverError::InvalidPolicy(_))
        ));
    }

    #[tokio::test]
    async fn no_record_means_none_configured() {
        let (server, resolver) =
            serve(ResponseTemplate::new(200).set_body_raw(ENFORCE_POLICY, "text/plain")).await;

        let resolution = resolver
            .resolve_from_txt("example.com", &["v=spf1 -all".to_string()])
            .await;
        assert_eq!(resolution, PolicyResolution::NoneConfigured);

        // The policy host must not be contacted without a record
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_records_are_invalid() {
        let (_server, resolver) =
            serve(ResponseTemplate::new(200).set_body_raw(ENFORCE_POLICY, "text/plain")).await;
        let txts = vec!["v=STSv1; id=1".to_string(), "v=STSv1; id=2".to_string()];
        assert!(matches!(
            resolver.resolve_from_txt("example.com", &txts).await,
            PolicyResolution::Invalid { .. }
        ));
    }
}
