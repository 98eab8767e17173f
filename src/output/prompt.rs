use std::io::{self, BufRead, Write};

use crate::types::Job;

/// Lists `jobs` and asks whether to go ahead with `action`.
///
/// Asks again until the answer starts with `y` or `n`. End of input counts
/// as no.
pub fn confirm(
    action: &str,
    jobs: &[Job],
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<bool> {
    writeln!(output, "The pattern matches {} jobs:", jobs.len())?;
    for job in jobs {
        writeln!(output, "  {}", job.name)?;
    }

    loop {
        write!(output, "{action} all of them? [y/N] ")?;
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        match answer.trim_start().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('y') => return Ok(true),
            Some('n') => return Ok(false),
            _ => {}
        }
    }
}
