use std::path::PathBuf;

use tracing::{info, warn};

use crate::school::{SchoolClient, SchoolError, Subject};

pub const DEFAULT_TEMPLATE: &str = "subject_{name}.html";

/// Output path for `subject_name`: `{name}` in the template is replaced by the
/// name with spaces turned into underscores.
pub fn output_path(template: &str, subject_name: &str) -> PathBuf {
    PathBuf::from(template.replace("{name}", &subject_name.replace(' ', "_")))
}

/// Joins the textbook text of every lesson and writes it to the templated
/// path, if one is given. Stops at the first failing lesson.
pub async fn export_subject_text(
    client: &SchoolClient,
    subject: &mut Subject,
    template: Option<&str>,
) -> Result<String, SchoolError> {
    let text = subject.load_lessons_text(client).await?;
    if let Some(template) = template {
        let path = output_path(template, &subject.name);
        std::fs::write(&path, &text)?;
        info!(path = %path.display(), bytes = text.len(), "export written");
    }
    Ok(text)
}

/// Like [`export_subject_text`], but an expired token (401/403) triggers one
/// re-authentication and a restart of the whole subject from its first lesson.
pub async fn export_with_reauth(
    client: &mut SchoolClient,
    subject: &mut Subject,
    template: Option<&str>,
) -> Result<String, SchoolError> {
    match export_subject_text(client, subject, template).await {
        Err(SchoolError::Unauthorized(status)) => {
            warn!(%status, subject = %subject.name, "token rejected, restarting export");
            println!("[!] Token expired, trying to re-authenticate...");
            client.authenticate().await?;
            export_subject_text(client, subject, template).await
        }
        result => result,
    }
}
