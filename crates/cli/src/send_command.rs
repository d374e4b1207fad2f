use {
    anyhow::Result,
    textrelay_relay::{Composer, SendForm},
    tracing::warn,
};

/// Submit one message and print the resulting banner. Returns whether the
/// send succeeded.
pub async fn run_send(composer: &Composer, to: String, text: String) -> Result<bool> {
    if !composer.is_available() {
        warn!("send attempted without an active session");
        println!("Not signed in. Run `textrelay auth login --token <TOKEN>` first.");
        return Ok(false);
    }

    let mut form = SendForm::new(to, text);
    let outcome = composer.submit(&mut form).await?;
    for line in banners(&form) {
        println!("{line}");
    }
    Ok(outcome.is_success())
}

fn banners(form: &SendForm) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(err) = form.error() {
        lines.push(format!("error: {err}"));
    }
    if let Some(ok) = form.success() {
        lines.push(format!("success: {ok}"));
    }
    lines
}
