use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

pub const FFMPEG_ENV: &str = "OLDFILM_FFMPEG";
pub const FFPROBE_ENV: &str = "OLDFILM_FFPROBE";

/// Explicit path, then the environment variable, then a bundled copy next to the executable,
/// then whatever `PATH` finds under `name`.
pub fn resolve_tool_path(explicit: Option<&str>, env_var: &str, name: &str) -> PathBuf {
    if let Some(p) = explicit.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(p);
    }

    if let Some(p) = std::env::var_os(env_var).filter(|p| !p.is_empty()) {
        return PathBuf::from(p);
    }

    // bundled: <exe>/../vendor/ffmpeg/<name>
    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let candidate = exe_dir
                .join("..")
                .join("vendor")
                .join("ffmpeg")
                .join(executable_name(name));
            if candidate.exists() {
                return candidate;
            }
        }
    }

    PathBuf::from(executable_name(name))
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// Spawn ffmpeg to emit raw RGBA frames at (approx) real-time speed from `start_ms`.
///
/// Frames come out top row first, at the source's native size and frame rate.
pub(crate) fn spawn_decoder(ffmpeg: &Path, file: &str, start_ms: u64) -> io::Result<Child> {
    let mut cmd = Command::new(ffmpeg);

    cmd.arg("-hide_banner").arg("-loglevel").arg("error");

    if start_ms > 0 {
        cmd.arg("-ss").arg(format!("{:.3}", start_ms as f64 / 1000.0));
    }

    cmd.arg("-re")
        .arg("-i")
        .arg(file)
        .arg("-an")
        .arg("-pix_fmt")
        .arg("rgba")
        .arg("-f")
        .arg("rawvideo")
        .arg("pipe:1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    cmd.spawn()
}

/// Runs ffprobe and returns its JSON report for the first video stream.
pub(crate) fn run_probe(ffprobe: &Path, file: &str) -> io::Result<std::process::Output> {
    Command::new(ffprobe)
        .arg("-v")
        .arg("error")
        .arg("-select_streams")
        .arg("v:0")
        .arg("-show_entries")
        .arg("stream=width,height,r_frame_rate:format=duration")
        .arg("-of")
        .arg("json")
        .arg(file)
        .stdin(Stdio::null())
        .output()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let p = resolve_tool_path(Some("/opt/ff/ffmpeg"), FFMPEG_ENV, "ffmpeg");
        assert_eq!(p, PathBuf::from("/opt/ff/ffmpeg"));
    }

    #[test]
    fn blank_explicit_path_is_ignored() {
        let p = resolve_tool_path(Some(" "), "OLDFILM_TEST_UNSET_VAR", "ffprobe");
        assert_ne!(p, PathBuf::from(" "));
        assert!(p.ends_with(executable_name("ffprobe")));
    }
}
