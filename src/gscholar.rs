//! Google Scholar page retrieval over HTTP.
//!
//! [`ScholarClient`] implements [`ScholarSource`] by fetching profile and
//! "Cited by" pages with `reqwest` and reading their fields with `scraper`.
//! Every page fetch goes through a bounded retry loop with exponential backoff.
//! Failures never escape: a page that cannot be fetched ends pagination and
//! whatever was collected so far is returned.

use crate::config::ClientOptions;
use crate::cookies::CookieStore;
use crate::error::{Result, SelfCiteError};
use crate::source::{AuthorProfile, RawCitation, RawPublication, ScholarSource};
use rand::Rng;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

/// User agent string for requests
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Rows requested per profile page; Scholar's maximum
const PROFILE_PAGE_SIZE: usize = 100;

/// Results per "Cited by" page
const CITATIONS_PAGE_SIZE: usize = 10;

/// Wait after a 429 without a usable Retry-After header
const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 60;

/// Phrases found on Scholar's CAPTCHA and block pages.
const CAPTCHA_INDICATORS: &[&str] = &[
    "our systems have detected unusual traffic",
    "please show you're not a robot",
    "please solve this captcha",
    "solving the above captcha",
    "unusual traffic from your computer network",
    "your computer or network may be sending automated queries",
    "id=\"gs_captcha_f\"",
];

/// One "Cited by" page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationPage {
    pub items: Vec<RawCitation>,
    pub has_next: bool,
}

/// HTTP client for Scholar profile and citation pages.
pub struct ScholarClient {
    client: reqwest::Client,
    base_url: Url,
    cookies: CookieStore,
    options: ClientOptions,
}

impl ScholarClient {
    /// Build a client. Fails on an invalid base or proxy URL.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let base_url = Url::parse(options.base_url.trim_end_matches('/'))
            .map_err(|e| SelfCiteError::Config(format!("Invalid base URL: {}", e)))?;

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .cookie_store(true);

        if let Some(proxy_url) = options.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                SelfCiteError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| SelfCiteError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let cookies = match &options.cookie_path {
            Some(path) => CookieStore::with_path(path.clone()),
            None => CookieStore::default(),
        };
        if cookies.load().is_empty() {
            warn!("No cookies loaded. Run 'rustselfcite cookies import' if Scholar blocks requests.");
        }

        Ok(Self {
            client,
            base_url,
            cookies,
            options,
        })
    }

    /// Resolve a possibly relative URL against the Scholar base URL.
    fn resolve(&self, url: &str) -> Result<Url> {
        self.base_url
            .join(url)
            .map_err(|e| SelfCiteError::Config(format!("Invalid URL '{}': {}", url, e)))
    }

    /// Fetch a page, retrying with exponential backoff.
    ///
    /// In interactive mode a CAPTCHA pauses for the operator and the page is
    /// fetched again; such pauses do not use up an attempt.
    async fn fetch_html(&self, url: &Url) -> Result<String> {
        let max_attempts = self.options.max_attempts.max(1);
        let mut backoff = self.options.initial_backoff;
        let mut last_error = SelfCiteError::Parse("no attempt made".to_string());
        let mut attempt = 0;

        while attempt < max_attempts {
            self.polite_delay().await;

            let wait = match self.fetch_once(url).await {
                Ok(html) => return Ok(html),
                Err(SelfCiteError::Captcha) if self.options.interactive => {
                    warn!(attempt = attempt + 1, url = %url, "CAPTCHA detected, waiting for manual intervention");
                    self.wait_for_operator().await?;
                    last_error = SelfCiteError::Captcha;
                    continue;
                }
                Err(SelfCiteError::Captcha) => {
                    error!(url = %url, "Google Scholar is blocking access. Consider refreshing cookies or waiting.");
                    return Err(SelfCiteError::Captcha);
                }
                Err(SelfCiteError::RateLimited(secs)) => {
                    last_error = SelfCiteError::RateLimited(secs);
                    Duration::from_secs(secs).max(backoff)
                }
                Err(e) => {
                    last_error = e;
                    backoff
                }
            };
            attempt += 1;

            if attempt < max_attempts {
                warn!(
                    attempt,
                    wait_secs = wait.as_secs(),
                    error = %last_error,
                    "Page fetch failed, retrying"
                );
                tokio::time::sleep(wait).await;
                backoff *= 2;
            }
        }

        error!(url = %url, attempts = max_attempts, error = %last_error, "Failed to load page");
        Err(last_error)
    }

    async fn fetch_once(&self, url: &Url) -> Result<String> {
        let mut request = self
            .client
            .get(url.as_str())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9");

        let cookie_header = self.cookies.header();
        if !cookie_header.is_empty() {
            request = request.header("Cookie", cookie_header);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS);
            return Err(SelfCiteError::RateLimited(retry_after));
        }
        if !status.is_success() {
            return Err(SelfCiteError::Api {
                code: status.as_u16() as i32,
                message: format!("HTTP error: {}", status),
            });
        }

        let html = response.text().await?;
        if is_captcha_page(&html) {
            return Err(SelfCiteError::Captcha);
        }
        Ok(html)
    }

    /// Random pause before each request.
    async fn polite_delay(&self) {
        let min = self.options.min_delay.as_millis() as u64;
        let max = (self.options.max_delay.as_millis() as u64).max(min);
        let delay = rand::thread_rng().gen_range(min..=max);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    /// Block until the operator confirms the CAPTCHA is solved.
    async fn wait_for_operator(&self) -> Result<()> {
        eprintln!();
        eprintln!("Google Scholar is asking for a CAPTCHA.");
        eprintln!("Solve it in your browser, re-export your cookies with");
        eprintln!("  rustselfcite cookies import   (file: {})", self.cookies.path().display());
        eprintln!("then press Enter to continue.");

        tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| ())
        })
        .await
        .map_err(|e| SelfCiteError::Config(format!("Prompt task failed: {}", e)))??;

        info!("Resuming after manual intervention");
        Ok(())
    }
}

impl ScholarSource for ScholarClient {
    async fn fetch_author_profile(&self, profile_url: &str) -> AuthorProfile {
        let url = match self.resolve(profile_url) {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Error getting author details");
                return AuthorProfile::unknown();
            }
        };

        match self.fetch_html(&url).await {
            Ok(html) => parse_author_profile(&html).unwrap_or_else(|| {
                warn!("Author name not found on profile page");
                AuthorProfile::unknown()
            }),
            Err(e) => {
                error!(error = %e, "Error getting author details");
                AuthorProfile::unknown()
            }
        }
    }

    async fn fetch_publication_list(
        &self,
        profile_url: &str,
        max_papers: Option<usize>,
        cancel: &CancellationToken,
    ) -> Vec<RawPublication> {
        let profile = match self.resolve(profile_url) {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Error getting publications");
                return Vec::new();
            }
        };

        let mut publications = Vec::new();
        loop {
            if cancel.is_cancelled() {
                info!("Cancelled while loading publications");
                break;
            }

            let start = publications.len().to_string();
            let page_size = PROFILE_PAGE_SIZE.to_string();
            let url = with_query_params(
                &profile,
                &[("hl", "en"), ("cstart", start.as_str()), ("pagesize", page_size.as_str())],
            );
            debug!(url = %url, "Fetching publication page");

            let html = match self.fetch_html(&url).await {
                Ok(html) => html,
                Err(e) => {
                    error!(error = %e, loaded = publications.len(), "Error getting publications");
                    break;
                }
            };
            let rows = match parse_publication_rows(&html, &self.base_url) {
                Ok(rows) => rows,
                Err(e) => {
                    error!(error = %e, "Error parsing publications");
                    break;
                }
            };

            let page_len = rows.len();
            publications.extend(rows);
            debug!(page_rows = page_len, total = publications.len(), "Loaded publication rows");

            if page_len < PROFILE_PAGE_SIZE || max_papers.is_some_and(|m| publications.len() >= m) {
                break;
            }
        }

        if let Some(max) = max_papers {
            publications.truncate(max);
        }
        info!(count = publications.len(), "Loaded publication list");
        publications
    }

    async fn fetch_citing_works(
        &self,
        citation_url: &str,
        max_citations: Option<usize>,
        cancel: &CancellationToken,
    ) -> Vec<RawCitation> {
        let first = match self.resolve(citation_url) {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Invalid citation URL");
                return Vec::new();
            }
        };

        let mut citations = Vec::new();
        let mut page_num = 0;
        loop {
            if cancel.is_cancelled() {
                info!("Cancelled while loading citing works");
                break;
            }

            let url = if page_num == 0 {
                first.clone()
            } else {
                let start = (page_num * CITATIONS_PAGE_SIZE).to_string();
                with_query_params(&first, &[("start", start.as_str())])
            };
            debug!(page = page_num, url = %url, "Fetching citation page");

            let page = match self.fetch_html(&url).await {
                Ok(html) => parse_citation_page(&html, &self.base_url),
                Err(e) => {
                    error!(page = page_num, error = %e, "Failed to load citation page");
                    break;
                }
            };
            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    error!(page = page_num, error = %e, "Error processing citation page");
                    break;
                }
            };

            let page_empty = page.items.is_empty();
            citations.extend(page.items);

            if max_citations.is_some_and(|m| citations.len() >= m) || page_empty || !page.has_next {
                break;
            }
            page_num += 1;
        }

        if let Some(max) = max_citations {
            citations.truncate(max);
        }
        citations
    }
}

/// Whether `html` is a CAPTCHA or "unusual traffic" page.
pub fn is_captcha_page(html: &str) -> bool {
    let text = html.to_lowercase();
    CAPTCHA_INDICATORS.iter().any(|indicator| text.contains(indicator))
}

/// Copy of `url` with `params` set, replacing any existing values.
pub fn with_query_params(url: &Url, params: &[(&str, &str)]) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !params.iter().any(|(name, _)| name == k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut out = url.clone();
    {
        let mut pairs = out.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        for (k, v) in params {
            pairs.append_pair(k, v);
        }
    }
    out
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SelfCiteError::Parse(e.to_string()))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn resolve_href(base: &Url, element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("href")
        .and_then(|href| base.join(href).ok())
        .map(String::from)
}

/// Read the owner's name and affiliation from a profile page.
pub fn parse_author_profile(html: &str) -> Option<AuthorProfile> {
    let document = Html::parse_document(html);
    let name_selector = selector("#gsc_prf_in").ok()?;
    let affiliation_selector = selector(".gsc_prf_il").ok()?;

    let name = document.select(&name_selector).next().map(element_text)?;
    if name.is_empty() {
        return None;
    }
    let affiliation = document
        .select(&affiliation_selector)
        .next()
        .map(element_text)
        .filter(|a| !a.is_empty());

    Some(AuthorProfile { name, affiliation })
}

/// Read the rows of a profile's publication table.
pub fn parse_publication_rows(html: &str, base: &Url) -> Result<Vec<RawPublication>> {
    let document = Html::parse_document(html);

    let row_selector = selector("tr.gsc_a_tr")?;
    let title_selector = selector("a.gsc_a_at")?;
    let gray_selector = selector(".gs_gray")?;
    let cite_selector = selector("a.gsc_a_ac")?;
    let year_selector = selector(".gsc_a_y .gsc_a_h")?;

    let mut rows = Vec::new();
    for row in document.select(&row_selector) {
        let mut raw = RawPublication::default();

        if let Some(title) = row.select(&title_selector).next() {
            raw.title = element_text(title);
            raw.url = resolve_href(base, title);
        }

        let mut gray = row.select(&gray_selector);
        raw.authors = gray.next().map(element_text).unwrap_or_default();
        raw.venue = gray.next().map(element_text).unwrap_or_default();

        if let Some(cite) = row.select(&cite_selector).next() {
            raw.citation_count = element_text(cite);
            raw.citation_url = resolve_href(base, cite);
        }

        raw.year = row
            .select(&year_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();

        rows.push(raw);
    }

    Ok(rows)
}

/// Read the entries of a "Cited by" page and whether a next page exists.
pub fn parse_citation_page(html: &str, base: &Url) -> Result<CitationPage> {
    let document = Html::parse_document(html);

    let item_selector = selector("div.gs_ri")?;
    let title_selector = selector("h3.gs_rt")?;
    let link_selector = selector("h3.gs_rt a")?;
    let info_selector = selector("div.gs_a")?;
    let next_selector = selector("a .gs_ico_nav_next, button.gs_btnPR:not([disabled])")?;

    let items = document
        .select(&item_selector)
        .map(|item| RawCitation {
            title: item
                .select(&title_selector)
                .next()
                .map(element_text)
                .unwrap_or_default(),
            url: item
                .select(&link_selector)
                .next()
                .and_then(|link| resolve_href(base, link)),
            info: item
                .select(&info_selector)
                .next()
                .map(element_text)
                .unwrap_or_default(),
        })
        .collect();

    Ok(CitationPage {
        items,
        has_next: document.select(&next_selector).next().is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://scholar.google.com").expect("valid base")
    }

    const PROFILE_HTML: &str = r#"
        <html><body>
          <div id="gsc_prf_in">Jane Q. Smith</div>
          <div class="gsc_prf_il">Professor, Example University</div>
          <table id="gsc_a_t"><tbody id="gsc_a_b">
            <tr class="gsc_a_tr">
              <td class="gsc_a_t">
                <a href="/citations?view_op=view_citation&citation_for_view=abc" class="gsc_a_at">Deep things</a>
                <div class="gs_gray">J Smith, A Jones</div>
                <div class="gs_gray">Nature<span class="gs_oph">, 2019</span></div>
              </td>
              <td class="gsc_a_c"><a href="https://scholar.google.com/scholar?oi=bibs&hl=en&cites=123" class="gsc_a_ac gs_ibl">42</a></td>
              <td class="gsc_a_y"><span class="gsc_a_h gsc_a_hc gs_ibl">2019</span></td>
            </tr>
            <tr class="gsc_a_tr">
              <td class="gsc_a_t">
                <a href="/citations?view_op=view_citation&citation_for_view=def" class="gsc_a_at">Shallow things</a>
                <div class="gs_gray">J Smith</div>
                <div class="gs_gray"></div>
              </td>
              <td class="gsc_a_c"><a class="gsc_a_ac gs_ibl"></a></td>
              <td class="gsc_a_y"><span class="gsc_a_h gsc_a_hc gs_ibl"></span></td>
            </tr>
          </tbody></table>
        </body></html>
    "#;

    const CITATIONS_HTML: &str = r#"
        <html><body>
          <div class="gs_r gs_or gs_scl"><div class="gs_ri">
            <h3 class="gs_rt"><span class="gs_ctg2">[PDF]</span> <a href="https://example.org/a">Follow-up work</a></h3>
            <div class="gs_a">J Smith, X Wang - Science, 2021 - science.org</div>
          </div></div>
          <div class="gs_r gs_or gs_scl"><div class="gs_ri">
            <h3 class="gs_rt"><span class="gs_ctu"><span class="gs_ct1">[CITATION]</span></span> Unlinked work</h3>
            <div class="gs_a">C Doe - 2020</div>
          </div></div>
          <div id="gs_n"><table><tr><td><a href="/scholar?start=10&cites=123"><span class="gs_ico gs_ico_nav_next"></span><b>Next</b></a></td></tr></table></div>
        </body></html>
    "#;

    #[test]
    fn test_parse_author_profile() {
        let profile = parse_author_profile(PROFILE_HTML).expect("profile");
        assert_eq!(profile.name, "Jane Q. Smith");
        assert_eq!(profile.affiliation.as_deref(), Some("Professor, Example University"));
        assert_eq!(parse_author_profile("<html></html>"), None);
    }

    #[test]
    fn test_parse_publication_rows() {
        let rows = parse_publication_rows(PROFILE_HTML, &base()).expect("parse");
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].title, "Deep things");
        assert_eq!(
            rows[0].url.as_deref(),
            Some("https://scholar.google.com/citations?view_op=view_citation&citation_for_view=abc")
        );
        assert_eq!(rows[0].authors, "J Smith, A Jones");
        assert_eq!(rows[0].venue, "Nature, 2019");
        assert_eq!(rows[0].citation_count, "42");
        assert_eq!(
            rows[0].citation_url.as_deref(),
            Some("https://scholar.google.com/scholar?oi=bibs&hl=en&cites=123")
        );
        assert_eq!(rows[0].year, "2019");

        assert_eq!(rows[1].citation_count, "");
        assert_eq!(rows[1].citation_url, None);
        assert_eq!(rows[1].year, "");
    }

    #[test]
    fn test_parse_citation_page() {
        let page = parse_citation_page(CITATIONS_HTML, &base()).expect("parse");
        assert!(page.has_next);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "[PDF] Follow-up work");
        assert_eq!(page.items[0].url.as_deref(), Some("https://example.org/a"));
        assert_eq!(page.items[0].info, "J Smith, X Wang - Science, 2021 - science.org");
        assert_eq!(page.items[1].title, "[CITATION] Unlinked work");
        assert_eq!(page.items[1].url, None);
    }

    #[test]
    fn test_last_citation_page() {
        let page = parse_citation_page("<html><body></body></html>", &base()).expect("parse");
        assert!(page.items.is_empty());
        assert!(!page.has_next);
    }

    #[test]
    fn test_captcha_detection() {
        assert!(is_captcha_page("<p>Our systems have detected unusual traffic</p>"));
        assert!(is_captcha_page("<form id=\"gs_captcha_f\"></form>"));
        assert!(!is_captcha_page(CITATIONS_HTML));
    }

    #[test]
    fn test_with_query_params_replaces() {
        let url = Url::parse("https://scholar.google.com/scholar?cites=1&start=10&hl=en")
            .expect("valid url");
        let next = with_query_params(&url, &[("start", "20")]);
        assert_eq!(next.as_str(), "https://scholar.google.com/scholar?cites=1&hl=en&start=20");

        let profile = Url::parse("https://scholar.google.com/citations?user=abc").expect("valid url");
        let paged = with_query_params(&profile, &[("cstart", "100"), ("pagesize", "100")]);
        assert_eq!(
            paged.as_str(),
            "https://scholar.google.com/citations?user=abc&cstart=100&pagesize=100"
        );
    }

    mod http {
        use super::*;
        use std::time::Instant;
        use tempfile::TempDir;
        use wiremock::matchers::{method, path, query_param, query_param_is_missing};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn client(server: &MockServer, dir: &TempDir) -> ScholarClient {
            let options = ClientOptions {
                base_url: server.uri(),
                initial_backoff: Duration::ZERO,
                min_delay: Duration::ZERO,
                max_delay: Duration::ZERO,
                cookie_path: Some(dir.path().join("cookies.json")),
                ..Default::default()
            };
            ScholarClient::new(options).expect("client")
        }

        fn citation_page(first: usize, count: usize, has_next: bool) -> String {
            let items: String = (first..first + count)
                .map(|i| {
                    format!(
                        r#"<div class="gs_ri"><h3 class="gs_rt"><a href="/w{i}">Work {i}</a></h3><div class="gs_a">A Author - Venue, 2020</div></div>"#
                    )
                })
                .collect();
            let next = if has_next {
                r#"<a href="/scholar?start=next"><span class="gs_ico gs_ico_nav_next"></span></a>"#
            } else {
                ""
            };
            format!("<html><body>{items}{next}</body></html>")
        }

        fn publication_page(first: usize, count: usize) -> String {
            let rows: String = (first..first + count)
                .map(|i| {
                    format!(
                        r#"<tr class="gsc_a_tr"><td><a class="gsc_a_at" href="/p{i}">Paper {i}</a><div class="gs_gray">J Smith</div><div class="gs_gray">Venue</div></td><td><a class="gsc_a_ac" href="/scholar?cites={i}">3</a></td><td class="gsc_a_y"><span class="gsc_a_h">2020</span></td></tr>"#
                    )
                })
                .collect();
            format!("<html><body><table>{rows}</table></body></html>")
        }

        async fn mount_page(server: &MockServer, start: Option<&str>, body: String, times: u64) {
            let mock = Mock::given(method("GET")).and(path("/scholar"));
            let mock = match start {
                Some(start) => mock.and(query_param("start", start)),
                None => mock.and(query_param_is_missing("start")),
            };
            mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
                .expect(times)
                .mount(server)
                .await;
        }

        #[tokio::test]
        async fn test_server_errors_retry_with_doubling_backoff() {
            let server = MockServer::start().await;
            let dir = TempDir::new().expect("tempdir");
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(500))
                .expect(3)
                .mount(&server)
                .await;

            let mut client = client(&server, &dir);
            client.options.initial_backoff = Duration::from_millis(50);

            let started = Instant::now();
            let url = client.resolve("/scholar?cites=1").expect("url");
            let result = client.fetch_html(&url).await;

            assert!(matches!(result, Err(SelfCiteError::Api { code: 500, .. })));
            // 50ms then 100ms between the three attempts
            assert!(started.elapsed() >= Duration::from_millis(150));
            server.verify().await;
        }

        #[tokio::test]
        async fn test_rate_limit_uses_retry_after() {
            let server = MockServer::start().await;
            let dir = TempDir::new().expect("tempdir");
            Mock::given(method("GET"))
                .and(path("/limited"))
                .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/limited-bare"))
                .respond_with(ResponseTemplate::new(429))
                .mount(&server)
                .await;

            let mut client = client(&server, &dir);
            client.options.max_attempts = 1;

            let url = client.resolve("/limited").expect("url");
            assert!(matches!(client.fetch_html(&url).await, Err(SelfCiteError::RateLimited(7))));
            let url = client.resolve("/limited-bare").expect("url");
            assert!(matches!(
                client.fetch_html(&url).await,
                Err(SelfCiteError::RateLimited(DEFAULT_RATE_LIMIT_WAIT_SECS))
            ));
        }

        #[tokio::test]
        async fn test_rate_limited_page_is_retried() {
            let server = MockServer::start().await;
            let dir = TempDir::new().expect("tempdir");
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
                .up_to_n_times(1)
                .expect(1)
                .mount(&server)
                .await;
            mount_page(&server, None, citation_page(0, 2, false), 1).await;

            let client = client(&server, &dir);
            let citations = client
                .fetch_citing_works("/scholar?cites=1", None, &CancellationToken::new())
                .await;

            assert_eq!(citations.len(), 2);
            server.verify().await;
        }

        #[tokio::test]
        async fn test_captcha_without_operator_is_not_retried() {
            let server = MockServer::start().await;
            let dir = TempDir::new().expect("tempdir");
            Mock::given(method("GET"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string("<p>Our systems have detected unusual traffic</p>"),
                )
                .expect(1)
                .mount(&server)
                .await;

            let client = client(&server, &dir);
            let url = client.resolve("/scholar?cites=1").expect("url");
            assert!(matches!(client.fetch_html(&url).await, Err(SelfCiteError::Captcha)));
            server.verify().await;
        }

        #[tokio::test]
        async fn test_citing_works_stop_at_cap() {
            let server = MockServer::start().await;
            let dir = TempDir::new().expect("tempdir");
            mount_page(&server, None, citation_page(0, 10, true), 1).await;
            mount_page(&server, Some("10"), citation_page(10, 10, true), 1).await;
            mount_page(&server, Some("20"), citation_page(20, 10, true), 0).await;

            let client = client(&server, &dir);
            let citations = client
                .fetch_citing_works("/scholar?cites=1", Some(15), &CancellationToken::new())
                .await;

            assert_eq!(citations.len(), 15);
            assert_eq!(citations[0].title, "Work 0");
            assert_eq!(citations[14].title, "Work 14");
            server.verify().await;
        }

        #[tokio::test]
        async fn test_citing_works_stop_at_last_page() {
            let server = MockServer::start().await;
            let dir = TempDir::new().expect("tempdir");
            mount_page(&server, None, citation_page(0, 10, true), 1).await;
            mount_page(&server, Some("10"), citation_page(10, 3, false), 1).await;

            let client = client(&server, &dir);
            let citations = client
                .fetch_citing_works("/scholar?cites=1", None, &CancellationToken::new())
                .await;

            assert_eq!(citations.len(), 13);
            assert_eq!(
                citations[12].url.as_deref(),
                Some(format!("{}/w12", server.uri()).as_str())
            );
            server.verify().await;
        }

        #[tokio::test]
        async fn test_failed_later_page_keeps_earlier_pages() {
            let server = MockServer::start().await;
            let dir = TempDir::new().expect("tempdir");
            mount_page(&server, None, citation_page(0, 10, true), 1).await;
            Mock::given(method("GET"))
                .and(path("/scholar"))
                .and(query_param("start", "10"))
                .respond_with(ResponseTemplate::new(503))
                .expect(3)
                .mount(&server)
                .await;

            let client = client(&server, &dir);
            let citations = client
                .fetch_citing_works("/scholar?cites=1", None, &CancellationToken::new())
                .await;

            assert_eq!(citations.len(), 10);
            server.verify().await;
        }

        #[tokio::test]
        async fn test_cancelled_before_first_page() {
            let server = MockServer::start().await;
            let dir = TempDir::new().expect("tempdir");
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_string(citation_page(0, 10, true)))
                .expect(0)
                .mount(&server)
                .await;

            let cancel = CancellationToken::new();
            cancel.cancel();
            let client = client(&server, &dir);

            assert!(client.fetch_citing_works("/scholar?cites=1", None, &cancel).await.is_empty());
            assert!(client
                .fetch_publication_list("/citations?user=abc", None, &cancel)
                .await
                .is_empty());
            server.verify().await;
        }

        #[tokio::test]
        async fn test_publication_list_paginates() {
            let server = MockServer::start().await;
            let dir = TempDir::new().expect("tempdir");
            Mock::given(method("GET"))
                .and(path("/citations"))
                .and(query_param("user", "abc"))
                .and(query_param("cstart", "0"))
                .and(query_param("pagesize", "100"))
                .respond_with(ResponseTemplate::new(200).set_body_string(publication_page(0, 100)))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/citations"))
                .and(query_param("cstart", "100"))
                .respond_with(ResponseTemplate::new(200).set_body_string(publication_page(100, 5)))
                .expect(1)
                .mount(&server)
                .await;

            let client = client(&server, &dir);
            let publications = client
                .fetch_publication_list("/citations?user=abc", None, &CancellationToken::new())
                .await;

            assert_eq!(publications.len(), 105);
            assert_eq!(publications[104].title, "Paper 104");
            assert_eq!(publications[0].citation_count, "3");
            server.verify().await;
        }

        #[tokio::test]
        async fn test_publication_list_stops_at_max_papers() {
            let server = MockServer::start().await;
            let dir = TempDir::new().expect("tempdir");
            Mock::given(method("GET"))
                .and(path("/citations"))
                .and(query_param("cstart", "0"))
                .respond_with(ResponseTemplate::new(200).set_body_string(publication_page(0, 100)))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/citations"))
                .and(query_param("cstart", "100"))
                .respond_with(ResponseTemplate::new(200).set_body_string(publication_page(100, 5)))
                .expect(0)
                .mount(&server)
                .await;

            let client = client(&server, &dir);
            let publications = client
                .fetch_publication_list("/citations?user=abc", Some(30), &CancellationToken::new())
                .await;

            assert_eq!(publications.len(), 30);
            server.verify().await;
        }
    }

    #[test]
    fn test_invalid_proxy_is_config_error() {
        let options = ClientOptions {
            proxy: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(ScholarClient::new(options), Err(SelfCiteError::Config(_))));
    }
}
