use std::io::{self, Write};

/// Writes one line of user-facing output, such as the run summary.
///
/// The acceptance tests pass a buffer as `writer` to capture what the user
/// would see. A failed stdout write is reported on stderr and does not fail
/// the run; a failed `writer` write does.
pub fn println(message: &str, writer: &mut Option<&mut dyn Write>) -> io::Result<()> {
    if let Err(e) = writeln!(io::stdout(), "{message}") {
        eprintln!("Failed to write to stdout: {e}");
    }

    if let Some(w) = writer {
        writeln!(w, "{message}")?;
    }

    Ok(())
}
