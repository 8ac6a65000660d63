use std::fs::File;
use std::ops::Deref;

/// Gets the contents of a trace file as a byte slice.
///
/// Trace files can run to many millions of lines, so on unix systems the file
/// is memory mapped instead of read eagerly; reads during parsing are
/// sequential, and the OS is advised as much.
#[cfg(unix)]
pub fn map_trace_file(file: &File) -> Result<impl Deref<Target = [u8]>, String> {
    use memmap2::{Advice, Mmap};
    unsafe {
        let m = Mmap::map(file).map_err(|e| format!("Couldn't memory map the file: {e}"))?;
        m.advise(Advice::Sequential)
            .map_err(|e| format!("Failed to provide access advice to the OS, {e}"))?;
        Ok(m)
    }
}

/// Compatibility on other systems
#[cfg(not(unix))]
pub fn map_trace_file(file: &File) -> Result<impl Deref<Target = [u8]>, String> {
    use std::io::Read;
    let mut file = file;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .map_err(|e| format!("Couldn't read the file: {e}"))?;
    Ok(buf)
}
