//! Terminal output helpers

use derive_new::new;
use is_terminal::IsTerminal;
use minus::Pager;
use std::io::{self, Write};

/// Setting this variable (to anything) disables the pager.
pub const NO_PAGER_ENV: &str = "NO_PAGER";

/// Adapts the minus pager to `std::io::Write` so output code can target either it or stdout.
///
/// ```ignore
/// let pager = Pager::new();
/// let mut writer = PagerWriter::new(pager.clone());
/// writeln!(writer, "Some long output...")?;
/// minus::page_all(pager)?;
/// ```
#[derive(new)]
pub struct PagerWriter {
    pager: Pager,
}

impl Write for PagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s =
            std::str::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.pager.push_str(s).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn should_page() -> bool {
    io::stdout().is_terminal() && std::env::var_os(NO_PAGER_ENV).is_none()
}

/// Run `render` against the pager when stdout is an interactive terminal, else against stdout.
pub fn write_paged(
    render: impl FnOnce(&mut dyn Write) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    if should_page() {
        let pager = Pager::new();
        render(&mut PagerWriter::new(pager.clone()))?;
        minus::page_all(pager)?;
    } else {
        let mut stdout = io::stdout().lock();
        render(&mut stdout)?;
        stdout.flush()?;
    }

    Ok(())
}
