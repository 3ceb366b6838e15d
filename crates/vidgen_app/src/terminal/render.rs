//! Plain-text rendering of the view model.
use std::fmt::Write;

use chrono::DateTime;
use vidgen_core::{AssetBundle, JobRowView, ObservedJobView, PollPhase, Script, Tone};

const BAR_WIDTH: usize = 24;

/// Wraps `text` in the ANSI colour for `tone` when `color` is set.
pub fn paint(text: &str, tone: Tone, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    let code = match tone {
        Tone::Neutral => "37",
        Tone::Active => "36",
        Tone::Milestone => "34",
        Tone::Success => "32",
        Tone::Danger => "31",
        Tone::Muted => "90",
    };
    format!("\x1b[{code}m{text}\x1b[0m")
}

pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Seconds since the epoch as a UTC timestamp; zero and invalid values render as `-`.
pub fn format_timestamp(secs: f64) -> String {
    if !secs.is_finite() || secs <= 0.0 {
        return "-".to_string();
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9) as u32;
    match DateTime::from_timestamp(whole, nanos) {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "-".to_string(),
    }
}

/// One line summarising the observed job, printed whenever it changes.
pub fn status_line(view: &ObservedJobView, color: bool) -> String {
    if view.phase == PollPhase::Gone {
        let message = view
            .error
            .as_ref()
            .map(|failure| failure.message.as_str())
            .unwrap_or_default();
        return format!("{}  {}", view.job_id, paint(message, Tone::Danger, color));
    }

    let mut line = view.job_id.clone();
    match (&view.snapshot, &view.status_style) {
        (Some(snapshot), Some(style)) => {
            let badge = format!("{} {}", style.icon, style.label);
            let _ = write!(
                line,
                "  {}  {}",
                paint(&badge, style.tone, color),
                progress_bar(view.progress)
            );
            if let Some(step) = snapshot.current_step.as_deref().filter(|s| !s.is_empty()) {
                let _ = write!(line, "  {step}");
            }
        }
        _ => line.push_str("  waiting for first status…"),
    }
    if view.cancelling {
        line.push_str("  (cancelling)");
    }
    if let Some(failure) = &view.error {
        let note = format!("({failure}; will retry)");
        let _ = write!(line, "  {}", paint(&note, Tone::Danger, color));
    }
    line
}

/// Multi-line description of the observed job.
pub fn observed_details(view: &ObservedJobView, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", status_line(view, color));
    let Some(snapshot) = &view.snapshot else {
        return out;
    };

    if !snapshot.prompt.is_empty() {
        let _ = writeln!(out, "  prompt:    {}", snapshot.prompt);
    }
    let _ = writeln!(out, "  created:   {}", format_timestamp(snapshot.created_at));
    if let Some(completed) = snapshot.completed_at {
        let _ = writeln!(out, "  completed: {}", format_timestamp(completed));
    }
    if let Some(error) = snapshot.error.as_deref().filter(|e| !e.is_empty()) {
        let _ = writeln!(out, "  error:     {}", paint(error, Tone::Danger, color));
    }
    for step in &snapshot.steps {
        let style = step.status.style();
        let _ = write!(
            out,
            "  - {:<20} {} {}",
            step.name,
            paint(&style.label, style.tone, color),
            progress_bar(step.progress_percent())
        );
        if let Some(message) = step.message.as_deref().filter(|m| !m.is_empty()) {
            let _ = write!(out, "  {message}");
        }
        out.push('\n');
    }

    let available: Vec<&str> = [
        (view.tabs.script, "script"),
        (view.tabs.assets, "assets"),
        (view.tabs.video, "video"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
    .collect();
    if !available.is_empty() {
        let _ = writeln!(out, "  available: {}", available.join(", "));
    }
    if let Some(url) = &view.video_url {
        let _ = writeln!(out, "  video:     {url}");
    }
    out
}

pub fn job_table(rows: &[JobRowView], remembered: Option<&str>, color: bool) -> String {
    if rows.is_empty() {
        return "No jobs yet.\n".to_string();
    }
    let mut out = String::new();
    for row in rows {
        let marker = if row.selected || remembered == Some(row.job_id.as_str()) {
            '*'
        } else {
            ' '
        };
        let badge = format!("{} {}", row.style.icon, row.style.label);
        let video = if row.video_ready { "video" } else { "" };
        let _ = writeln!(
            out,
            "{marker} {:<36} {:<22} {:<23} {:<5} {}",
            row.job_id,
            paint(&badge, row.style.tone, color),
            format_timestamp(row.created_at),
            video,
            truncate(&row.prompt, 60)
        );
    }
    out
}

pub fn script_text(script: &Script) -> String {
    let mut out = String::new();
    let title = if script.title.is_empty() {
        "Untitled script"
    } else {
        script.title.as_str()
    };
    let _ = writeln!(out, "{title}");
    if let Some(style) = script.style.as_deref() {
        let _ = writeln!(out, "style: {style}");
    }
    let _ = writeln!(
        out,
        "{} scene(s), {:.1}s total",
        script.scenes.len(),
        script.total_duration()
    );
    for (index, scene) in script.scenes.iter().enumerate() {
        let _ = writeln!(
            out,
            "\nScene {} ({:.1}s)\n  {}",
            index + 1,
            scene.duration,
            scene.description
        );
        if let Some(camera) = scene.camera.as_deref() {
            let _ = writeln!(out, "  camera:    {camera}");
        }
        if let Some(effects) = scene.effects.as_deref() {
            let _ = writeln!(out, "  effects:   {effects}");
        }
        if let Some(narration) = scene.narration.as_deref() {
            let _ = writeln!(out, "  narration: {narration}");
        }
        if !scene.visuals.is_empty() {
            let _ = writeln!(out, "  visuals:   {}", scene.visuals.join(", "));
        }
    }
    out
}

pub fn asset_list(bundle: &AssetBundle) -> String {
    if bundle.is_empty() {
        return "No assets.\n".to_string();
    }
    let mut out = String::new();
    for category in bundle.categories() {
        let paths = bundle.get(category);
        let _ = writeln!(out, "{category} ({})", paths.len());
        for path in paths {
            let _ = writeln!(out, "  {path}");
        }
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vidgen_core::{
        update, AppState, AssetCategory, FailureClass, FetchFailure, JobStatus, JobStatusSnapshot,
        Msg, Scene,
    };

    fn observed(result: Result<JobStatusSnapshot, FetchFailure>) -> ObservedJobView {
        let (state, _) = update(
            AppState::new(),
            Msg::JobSelected {
                job_id: "abc123".to_string(),
                now: 0,
            },
        );
        let (state, _) = update(
            state,
            Msg::StatusFetched {
                job_id: "abc123".to_string(),
                seq: 1,
                result,
                now: 10,
            },
        );
        state.view().observed.unwrap()
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0), format!("[{}]   0%", ".".repeat(24)));
        assert_eq!(progress_bar(50), format!("[{}{}]  50%", "#".repeat(12), ".".repeat(12)));
        assert_eq!(progress_bar(100), format!("[{}] 100%", "#".repeat(24)));
    }

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(format_timestamp(0.0), "-");
        assert_eq!(format_timestamp(1_700_000_000.5), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn status_line_shows_label_progress_and_step() {
        let view = observed(Ok(JobStatusSnapshot {
            job_id: "abc123".to_string(),
            status: JobStatus::Rendering,
            progress: 50.0,
            current_step: Some("encoding".to_string()),
            ..JobStatusSnapshot::default()
        }));
        let line = status_line(&view, false);
        assert!(line.starts_with("abc123  ▶ Rendering  ["));
        assert!(line.contains(" 50%"));
        assert!(line.ends_with("encoding"));
    }

    #[test]
    fn gone_job_shows_not_found_message() {
        let view = observed(Err(FetchFailure::new(FailureClass::NotFound, "HTTP 404")));
        assert_eq!(
            status_line(&view, false),
            "abc123  Job not found. It may have been deleted."
        );
    }

    #[test]
    fn completed_job_lists_video() {
        let view = observed(Ok(JobStatusSnapshot {
            job_id: "abc123".to_string(),
            status: JobStatus::Completed,
            progress: 100.0,
            video_ready: true,
            ..JobStatusSnapshot::default()
        }));
        let details = observed_details(&view, false);
        assert!(details.contains("available: video"));
        assert!(details.contains("video:     /api/video/abc123"));
    }

    #[test]
    fn script_lists_scenes() {
        let script = Script {
            title: "Sunrise".to_string(),
            scenes: vec![Scene {
                description: "Dark horizon".to_string(),
                duration: 4.0,
                camera: Some("slow pan".to_string()),
                ..Scene::default()
            }],
            ..Script::default()
        };
        let text = script_text(&script);
        assert!(text.starts_with("Sunrise\n1 scene(s), 4.0s total\n"));
        assert!(text.contains("Scene 1 (4.0s)\n  Dark horizon\n  camera:    slow pan\n"));
    }

    #[test]
    fn assets_are_grouped() {
        let mut bundle = AssetBundle::new();
        bundle.push(AssetCategory::Audio, "voice.mp3");
        bundle.push(AssetCategory::Images, "sky.png");
        assert_eq!(asset_list(&bundle), "images (1)\n  sky.png\naudio (1)\n  voice.mp3\n");
        assert_eq!(asset_list(&AssetBundle::new()), "No assets.\n");
    }

    #[test]
    fn colour_is_optional() {
        assert_eq!(paint("ok", Tone::Success, false), "ok");
        assert_eq!(paint("ok", Tone::Success, true), "\x1b[32mok\x1b[0m");
    }
}
