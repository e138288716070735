use std::fs::File;
use std::io::{stderr, stdout, Read, Write};
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::fs::{Fs, ModuleDirs};

use super::Error;

/// Run a subprocess, teeing stdout and stderr into the module's log dir.
/// Based on:
/// <https://stackoverflow.com/questions/66060139/how-to-tee-stdout-stderr-from-a-subprocess-in-rust>
pub fn run_cmd(cmd: &mut Command, fs: &Fs, dirs: &ModuleDirs, verbose: bool) -> Result<bool> {
    if verbose {
        eprintln!("{}", "Creating stdout and stderr files...".magenta());
    }

    let (out_file, err_file) = make_log_files(fs, dirs)?;

    if verbose {
        eprintln!("{}", "Running command...".magenta());
    }
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| {
            format!(
                "failed to execute child process {:?} {:?}",
                cmd.get_program(),
                cmd.get_args().collect::<Vec<_>>(),
            )
        })?;

    let child_out = child.stdout.take().ok_or(Error::ChildPipe("stdout"))?;
    let child_err = child.stderr.take().ok_or(Error::ChildPipe("stderr"))?;

    let thread_out = thread::spawn(move || communicate(child_out, out_file, stdout()));
    let thread_err = thread::spawn(move || communicate(child_err, err_file, stderr()));

    thread_out
        .join()
        .map_err(|_| Error::ChildPipe("stdout"))?
        .context("communicating with child stdout")?;
    thread_err
        .join()
        .map_err(|_| Error::ChildPipe("stderr"))?
        .context("communicating with child stderr")?;

    let status = child.wait().context("waiting on child process")?;

    if verbose {
        eprintln!("\n{} with {status}.", "Process finished".green());
    }
    Ok(status.success())
}

fn communicate<R: Read, W: Write>(
    mut stream: R,
    mut file: File,
    mut output: W,
) -> std::io::Result<()> {
    let mut buf = [0u8; 1024];
    loop {
        let num_read = stream.read(&mut buf)?;
        if num_read == 0 {
            break;
        }

        let buf = &buf[..num_read];
        file.write_all(buf)?;
        output.write_all(buf)?;
    }

    Ok(())
}

fn make_log_files(fs: &Fs, dirs: &ModuleDirs) -> Result<(File, File)> {
    fs.create_dir(&dirs.log)?;

    let out_file = fs
        .create_file(fs.stdout(dirs))
        .context("creating stdout.txt file")?;

    let err_file = fs
        .create_file(fs.stderr(dirs))
        .context("creating stderr.txt file")?;

    Ok((out_file, err_file))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_logs_are_captured() -> Result<()> {
        let dir = tempdir()?;
        let mut fs = Fs::new(dir.path(), false);
        fs.ensure_root_exists()?;
        let dirs = fs.module_dirs(0, "echo");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo out; echo err 1>&2");
        assert!(run_cmd(&mut cmd, &fs, &dirs, false)?);

        assert_eq!(std::fs::read_to_string(fs.stdout(&dirs))?, "out\n");
        assert_eq!(std::fs::read_to_string(fs.stderr(&dirs))?, "err\n");
        Ok(())
    }

    #[test]
    fn test_failure_status() -> Result<()> {
        let dir = tempdir()?;
        let mut fs = Fs::new(dir.path(), false);
        fs.ensure_root_exists()?;
        let dirs = fs.module_dirs(0, "fail");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("exit 3");
        assert!(!run_cmd(&mut cmd, &fs, &dirs, false)?);
        Ok(())
    }
}
