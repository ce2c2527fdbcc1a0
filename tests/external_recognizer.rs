//! End-to-end runs against a real child process.
//!
//! The recognizer's first argument is the source path, so running `/bin/sh` with a shell
//! script as the "source" turns the script into a fake recognizer that sees the real flag set.
#![cfg(unix)]

use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use livesub::{Controller, EngineOpts, Error, Language, RunEvent, RunState};

fn sh_controller() -> Controller {
    Controller::new(EngineOpts {
        program: PathBuf::from("/bin/sh"),
        model: "small".to_owned(),
        device: "cpu".to_owned(),
    })
}

fn write_script(dir: &Path, name: &str, body: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, body)?;
    Ok(path)
}

fn beam(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).expect("non-zero beam size")
}

#[test]
fn transcribes_from_a_child_process() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    // $2 = model, $4 = device, $12 = beam size, $14 = language.
    let script = write_script(
        dir.path(),
        "fake.sh",
        r#"echo "loading model $2 on $4" >&2
echo "Detected language"
echo "[0:00.000 --> 0:02.500] 你好"
echo "[0:02.500 --> 1:03.000] beam ${12} lang ${14}"
exit 3
"#,
    )?;

    let mut controller = sh_controller();
    controller.start(&script, Language::Japanese, beam(4), |_: &RunEvent| {})?;
    let outcome = controller.wait().expect("a run was started");

    assert_eq!(outcome.state(), RunState::Completed);
    assert_eq!(
        fs::read_to_string(dir.path().join("fake.ja.srt"))?,
        "1\n00:00:00,000 --> 00:00:02,500\n你好\n\n\
         2\n00:00:02,500 --> 00:01:03,000\nbeam 4 lang ja\n\n"
    );
    assert_eq!(fs::read_to_string(dir.path().join("fake.en.srt"))?, "");
    Ok(())
}

#[test]
fn stopping_kills_a_silent_loop_on_the_next_line() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let script = write_script(
        dir.path(),
        "loop.sh",
        r#"echo "[0:00.000 --> 0:01.000] first"
while true; do
  echo "still working"
  sleep 0.05
done
"#,
    )?;

    let (tx, rx) = mpsc::channel();
    let mut controller = sh_controller();
    controller.start(&script, Language::Chinese, beam(3), tx)?;

    loop {
        if let RunEvent::Segment(_) = rx.recv_timeout(Duration::from_secs(10))? {
            break;
        }
    }

    let outcome = controller.stop().expect("a run was active");
    assert_eq!(outcome.state(), RunState::Stopped);
    assert_eq!(outcome.segments(), 1);
    assert!(!dir.path().join("loop.zh.srt").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("loop.zh.tmp.srt"))?,
        "1\n00:00:00,000 --> 00:00:01,000\nfirst\n\n"
    );
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn recognizer_leads_its_own_process_group() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    // Field 5 of /proc/<pid>/stat is the process group id.
    let script = write_script(
        dir.path(),
        "pgrp.sh",
        r#"echo "[0:00.000 --> 0:01.000] $$ $(cut -d' ' -f5 /proc/$$/stat)"
"#,
    )?;

    let mut controller = sh_controller();
    controller.start(&script, Language::Korean, beam(3), ())?;
    let outcome = controller.wait().expect("a run was started");
    assert_eq!(outcome.state(), RunState::Completed);

    let srt = fs::read_to_string(dir.path().join("pgrp.ko.srt"))?;
    let text = srt.lines().nth(2).expect("segment text line");
    let (pid, pgrp) = text.split_once(' ').expect("pid and process group");
    assert_eq!(pid, pgrp);
    Ok(())
}

#[test]
fn missing_recognizer_fails_the_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut controller = Controller::new(EngineOpts {
        program: dir.path().join("no-such-recognizer"),
        ..EngineOpts::default()
    });

    controller.start(dir.path().join("x.wav"), Language::Chinese, beam(3), |_: &RunEvent| {})?;
    let outcome = controller.wait().expect("a run was started");

    assert_eq!(outcome.state(), RunState::Failed);
    assert!(matches!(outcome.error(), Some(Error::Spawn { .. })));
    assert!(!dir.path().join("x.zh.srt").exists());
    Ok(())
}
