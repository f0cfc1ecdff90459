// Drives the compiled binary through a PTY: real event loop, real crossterm
// input handling.
//
// Requires a TTY; uses expectrl which allocates a pseudo terminal.
// Unix-only and ignored by default. Run manually via:
// `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_session_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("typex");
    let cmd = format!("{} --ephemeral -p hi", bin.display());

    let mut p = spawn(cmd)?;

    // let the app enter the alternate screen
    std::thread::sleep(Duration::from_millis(200));

    // finishing the custom prompt lands on the results view
    p.send("hi")?;
    std::thread::sleep(Duration::from_millis(200));

    // results -> menu -> quit
    p.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("\x1b")?;

    p.expect(Eof)?;
    Ok(())
}
