use std::ffi::OsStr;
use std::process::Command;

use crate::error::CharmError;

pub fn run<S: AsRef<OsStr>>(cmd: &str, args: &[S]) -> Result<(), CharmError> {
    let status = Command::new(cmd)
        .args(args)
        .spawn()
        .map_err(|err| CharmError::SubcommandError(cmd.to_string(), err.to_string()))?
        .wait()
        .map_err(|err| CharmError::SubcommandError(cmd.to_string(), err.to_string()))?;

    if status.success() {
        Ok(())
    } else {
        Err(CharmError::SubcommandError(
            format!(
                "`{} {}`",
                cmd,
                args.iter()
                    .map(|a| a.as_ref().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            status.to_string(),
        ))
    }
}

pub fn get_output<S: AsRef<OsStr>>(cmd: &str, args: &[S]) -> Result<Vec<u8>, CharmError> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .map_err(|err| CharmError::SubcommandError(cmd.to_string(), err.to_string()))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(CharmError::SubcommandError(
            format!(
                "`{} {}`",
                cmd,
                args.iter()
                    .map(|a| a.as_ref().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            String::from_utf8_lossy(&output.stderr).to_string(),
        ))
    }
}

/// Like `get_output`, but a non-zero exit is data rather than an error.
/// Used for probes such as `glance-manage db version`.
pub fn try_output<S: AsRef<OsStr>>(cmd: &str, args: &[S]) -> Result<(i32, String), CharmError> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .map_err(|err| CharmError::SubcommandError(cmd.to_string(), err.to_string()))?;

    Ok((
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).trim().to_string(),
    ))
}
