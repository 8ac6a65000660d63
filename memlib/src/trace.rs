use lazy_static::lazy_static;
use regex::Regex;

/// One operation of an access trace. Addresses are unsigned and word aligned,
/// written words are 32-bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOp {
    Read(u32),
    Write(u32, i32),
}

lazy_static! {
    static ref OP_PATTERN: Regex =
        Regex::new(r"^(?P<op>[RW])\s+(?P<address>\d+)(?:\s+(?P<word>-?\d+))?$").unwrap();
}

/// Parses a text trace: one op per line, `R <address>` or `W <address>
/// <word>`, decimal, with `#` comments and blank lines skipped.
///
/// Malformed traces are a supplier problem, not a simulation error, so this
/// reports them as plain strings naming the offending line.
pub fn parse_trace(bytes: &[u8]) -> Result<Vec<TraceOp>, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("trace is not valid UTF-8: {e}"))?;
    let mut ops = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let captures = OP_PATTERN
            .captures(line)
            .ok_or_else(|| format!("line {}: can't parse trace op {line:?}", number + 1))?;
        let address = captures["address"]
            .parse::<u32>()
            .map_err(|e| format!("line {}: bad address: {e}", number + 1))?;
        let op = match &captures["op"] {
            "R" => TraceOp::Read(address),
            _ => {
                let word = captures
                    .name("word")
                    .ok_or_else(|| format!("line {}: write op is missing a value", number + 1))?
                    .as_str()
                    .parse::<i32>()
                    .map_err(|e| format!("line {}: bad write value: {e}", number + 1))?;
                TraceOp::Write(address, word)
            }
        };
        ops.push(op);
    }
    Ok(ops)
}

/// The fixed demonstration sequence the simulator runs when no trace file is
/// supplied: four distinct reads with two immediate repeats.
pub fn demo_trace() -> Vec<TraceOp> {
    vec![
        TraceOp::Read(17536),
        TraceOp::Read(17536),
        TraceOp::Read(1000),
        TraceOp::Read(1000),
        TraceOp::Read(17536),
        TraceOp::Read(20000),
    ]
}
