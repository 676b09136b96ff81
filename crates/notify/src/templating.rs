//! Minijinja template rendering for the digest message.
//!
//! Renders the digest subject and HTML body from the newly inserted
//! records. Templates are plain strings, so a fresh
//! [`minijinja::Environment`] is created per render call.

use lazyhire_core::ApplicationRecord;

use crate::traits::NotifyError;

/// Default subject line.
pub const DIGEST_SUBJECT: &str =
    "[LazyHire Daily Digest] {{ count }} New Job Opportunit{{ 'y' if count == 1 else 'ies' }}";

/// Default HTML body.
pub const DIGEST_BODY: &str = r#"<p>Hello,</p>
<p>Your scheduled job scrape found <strong>{{ count }} new opportunit{{ 'y' if count == 1 else 'ies' }}</strong> today. Review them on your dashboard:</p>

<a href="{{ dashboard_url }}" style="padding: 10px 20px; background-color: #007bff; color: white; text-decoration: none; border-radius: 5px; display: inline-block; margin: 15px 0;">Go to Dashboard</a>

<h3>New Jobs:</h3>
<ul style="list-style-type: none; padding-left: 0;">
{%- for job in jobs %}
    <li>
        <strong>{{ job.title | e }}</strong> at {{ job.company | e }}{% if job.location %} ({{ job.location | e }}){% endif %}
        <br><small>Notes: {{ job.notes | na | e }}</small>
    </li>
{%- endfor %}
</ul>

<p>Happy job hunting!</p>
"#;

/// Context data available to digest templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DigestContext {
    /// Number of records in the digest.
    pub count: usize,
    /// Link to the tracker dashboard.
    pub dashboard_url: String,
    /// One entry per newly inserted record, in insertion order.
    pub jobs: Vec<DigestEntry>,
}

/// The record fields a digest shows.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DigestEntry {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl DigestContext {
    pub fn new(records: &[ApplicationRecord], dashboard_url: &str) -> Self {
        Self {
            count: records.len(),
            dashboard_url: dashboard_url.to_string(),
            jobs: records
                .iter()
                .map(|r| DigestEntry {
                    title: r.title.clone(),
                    company: r.company.clone(),
                    location: r.location.clone(),
                    notes: r.notes.clone(),
                })
                .collect(),
        }
    }
}

/// Renders digest templates using minijinja.
#[derive(Debug)]
pub struct TemplateRenderer {
    subject: String,
    body: String,
}

impl TemplateRenderer {
    /// Renderer with the built-in digest templates.
    pub fn new() -> Self {
        Self::with_templates(DIGEST_SUBJECT, DIGEST_BODY)
    }

    pub fn with_templates(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Build a configured minijinja environment with custom filters.
    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_filter("na", na_filter);
        env
    }

    /// Render `(subject, body)` for the given context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if a template is invalid or
    /// rendering fails.
    pub fn render(&self, ctx: &DigestContext) -> Result<(String, String), NotifyError> {
        let env = Self::build_env();
        let subject = env
            .render_str(&self.subject, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        let body = env
            .render_str(&self.body, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok((subject.trim().to_string(), body))
    }

    /// Check that both templates parse, without evaluating them.
    pub fn validate(&self) -> Result<(), NotifyError> {
        let env = Self::build_env();
        for source in [&self.subject, &self.body] {
            env.template_from_str(source)
                .map_err(|e| NotifyError::Template(e.to_string()))?;
        }
        Ok(())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Custom filter: replace a missing or blank value with `"N/A"`.
fn na_filter(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, company: &str, location: Option<&str>, notes: Option<&str>) -> DigestEntry {
        DigestEntry {
            title: title.to_string(),
            company: company.to_string(),
            location: location.map(String::from),
            notes: notes.map(String::from),
        }
    }

    fn sample_context() -> DigestContext {
        DigestContext {
            count: 2,
            dashboard_url: "http://localhost:3000".to_string(),
            jobs: vec![
                entry(
                    "Frontend Engineer",
                    "Visma Oy",
                    Some("Finland (Remote)"),
                    Some("High priority match due to React/Vue experience."),
                ),
                entry("Node.js Backend Developer", "ABB Oy", Some("Tampere, Finland"), None),
            ],
        }
    }

    #[test]
    fn subject_counts_records() {
        let (subject, _) = TemplateRenderer::new().render(&sample_context()).unwrap();
        assert_eq!(subject, "[LazyHire Daily Digest] 2 New Job Opportunities");
    }

    #[test]
    fn subject_singular() {
        let mut ctx = sample_context();
        ctx.jobs.truncate(1);
        ctx.count = 1;
        let (subject, _) = TemplateRenderer::new().render(&ctx).unwrap();
        assert_eq!(subject, "[LazyHire Daily Digest] 1 New Job Opportunity");
    }

    #[test]
    fn body_lists_every_job() {
        let (_, body) = TemplateRenderer::new().render(&sample_context()).unwrap();
        assert!(body.contains("<strong>Frontend Engineer</strong> at Visma Oy (Finland (Remote))"));
        assert!(body.contains("<strong>Node.js Backend Developer</strong> at ABB Oy (Tampere, Finland)"));
        assert!(body.contains("Notes: High priority match due to React"));
        assert!(body.contains("Notes: N/A"));
        assert!(body.contains("href=\"http://localhost:3000\""));
        assert_eq!(body.matches("<li>").count(), 2);
    }

    #[test]
    fn body_escapes_html() {
        let mut ctx = sample_context();
        ctx.jobs = vec![entry("<script>", "A & B", None, None)];
        ctx.count = 1;
        let (_, body) = TemplateRenderer::new().render(&ctx).unwrap();
        assert!(body.contains("&lt;script&gt;"));
        assert!(body.contains("A &amp; B"));
        assert!(!body.contains("<script>"));
    }

    #[test]
    fn missing_location_is_omitted() {
        let mut ctx = sample_context();
        ctx.jobs = vec![entry("Dev", "Acme", None, Some("remote ok"))];
        ctx.count = 1;
        let (_, body) = TemplateRenderer::new().render(&ctx).unwrap();
        assert!(body.contains("<strong>Dev</strong> at Acme\n"));
    }

    #[test]
    fn na_filter_handles_blank() {
        assert_eq!(na_filter(None), "N/A");
        assert_eq!(na_filter(Some("  ".to_string())), "N/A");
        assert_eq!(na_filter(Some("ok".to_string())), "ok");
    }

    #[test]
    fn custom_templates() {
        let renderer = TemplateRenderer::with_templates("{{ count }} new", "{{ jobs[0].title }}");
        let (subject, body) = renderer.render(&sample_context()).unwrap();
        assert_eq!(subject, "2 new");
        assert_eq!(body, "Frontend Engineer");
    }

    #[test]
    fn validate_detects_syntax_errors() {
        assert!(TemplateRenderer::new().validate().is_ok());
        let broken = TemplateRenderer::with_templates("{{ count", "ok");
        let err = broken.validate().unwrap_err();
        assert!(matches!(err, NotifyError::Template(_)));
    }
}
