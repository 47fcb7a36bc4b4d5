use gather::Metadata;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const SPINNER_TEMPLATE: &str = "{prefix:.cyan.bold/blue.bold} 🔎 {msg:.cyan/blue} {spinner}";
const DONE_TEMPLATE: &str = "{prefix:.cyan.bold/blue.bold} {msg:.cyan/blue}";
const FAILED_TEMPLATE: &str = "{prefix:.cyan.bold/blue.bold} {msg:.red.bold}";

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn make_progress_spinner(m: &MultiProgress, prefix: String) -> ProgressBar {
    let pb = m.add(ProgressBar::new_spinner());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb.set_style(style(SPINNER_TEMPLATE).tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷"));
    pb.set_prefix(prefix);
    pb
}

/// Stop the spinner, leaving a one-line outcome for `name` in its place.
pub fn complete_progress_bar(pb: ProgressBar, name: &str, result: &Result<Metadata, gather::Error>) {
    let (template, status) = match result {
        Ok(metadata) => (
            DONE_TEMPLATE,
            format!("😸 {name} -> {}", metadata.destination().display()),
        ),
        Err(_) => (FAILED_TEMPLATE, format!("😿 failed to gather '{name}'")),
    };
    pb.set_style(style(template));
    pb.finish_with_message(status);
}
