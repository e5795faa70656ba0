use bitmask_enum::bitmask;

/// which outcomes `--trace` prints.
#[bitmask(u8)]
pub enum TraceFilter {
    Hit,
    Miss,
}

impl TraceFilter {
    pub fn accepts(&self, hit: bool) -> bool {
        if hit {
            self.contains(Self::Hit)
        } else {
            self.contains(Self::Miss)
        }
    }
}

peg::parser!(grammar token() for str {
    rule unsigned() -> u32
        = n:$(quiet!{['0'..='9']+}) {? n.parse().map_err(|_| "number within 32 bits") }
        / expected!("unsigned")
    rule kilo() = ['k' | 'K'] ("iB" / "B")?
    pub(crate) rule size() -> u32
        = n:unsigned() kilo() {? n.checked_mul(1024).ok_or("size within 32 bits") }
        / n:unsigned() "B"? { n }
    rule outcome() -> TraceFilter
        = "hit" { TraceFilter::Hit }
        / "miss" { TraceFilter::Miss }
        / expected!("hit or miss")
    pub(crate) rule trace_filter() -> TraceFilter
        = fs:(outcome() ++ ",") {
            fs.into_iter().fold(TraceFilter::none(), |acc, f| acc | f)
        }
});

/// cache size in bytes: `4096`, `4096B`, `4k`, `4kB` or `4KiB`.
pub fn parse_size(s: &str) -> Result<u32, String> {
    token::size(s.trim()).map_err(|e| format!("invalid size `{s}`: {e}"))
}

pub fn parse_trace_filter(s: &str) -> Result<TraceFilter, String> {
    token::trace_filter(s.trim()).map_err(|e| format!("invalid trace filter `{s}`: {e}"))
}
