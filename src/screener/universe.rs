//! Default scan universe
//!
//! Large and mid caps across sectors plus a few broad ETFs. Consumer staples
//! and utilities are where stable wheel candidates usually turn up.

const UNIVERSE: &[&str] = &[
    // Large cap tech
    "AAPL", "MSFT", "GOOGL", "GOOG", "META", "NVDA", "AMD", "INTC", "CSCO", "AVGO",
    "ORCL", "CRM", "ADBE", "IBM", "TXN", "QCOM", "AMAT", "LRCX", "KLAC", "MU",
    "ADI", "MRVL", "NXPI", "SNPS", "CDNS", "PANW", "CRWD", "ZS", "DDOG", "NET",
    "PLTR", "ANET", "FTNT", "WDAY", "NOW", "TEAM", "ZM", "DOCU",
    // Finance & Banking
    "JPM", "BAC", "WFC", "C", "GS", "MS", "BLK", "SCHW", "AXP", "USB",
    "PNC", "TFC", "COF", "BK", "STT", "FITB", "KEY", "RF", "CFG", "HBAN",
    "CME", "ICE", "SPGI", "MCO", "COIN", "HOOD", "SOFI", "AFRM", "PYPL", "SQ",
    // Insurance & Real Estate
    "BRK.B", "PGR", "TRV", "ALL", "AIG", "MET", "PRU", "AFL", "HIG", "CB",
    "PLD", "AMT", "EQIX", "PSA", "SPG", "O", "WELL", "DLR", "AVB", "EQR",
    // Consumer Discretionary
    "AMZN", "TSLA", "HD", "LOW", "MCD", "SBUX", "NKE", "TJX", "BKNG", "MAR",
    "ABNB", "LULU", "DECK", "RCL", "CCL", "NCLH", "LVS", "WYNN", "MGM", "CMG",
    "YUM", "QSR", "DPZ", "DKNG", "PENN", "F", "GM", "RIVN", "LCID", "UBER",
    "LYFT", "DASH", "EXPE", "EBAY", "ETSY", "W", "CHWY", "CVNA", "KMX",
    // Consumer Staples
    "WMT", "COST", "PG", "KO", "PEP", "PM", "MO", "CL", "KMB", "GIS",
    "K", "CPB", "KHC", "HSY", "MDLZ", "STZ", "TAP", "BUD", "KDP", "MNST",
    "KR", "SYY", "TSN", "HRL", "CAG", "EL", "CLX", "CHD", "CVS",
    // Healthcare & Pharma
    "UNH", "JNJ", "LLY", "ABBV", "MRK", "PFE", "TMO", "ABT", "DHR", "BMY",
    "AMGN", "GILD", "VRTX", "REGN", "BIIB", "MRNA", "BNTX", "ZTS", "ISRG", "SYK",
    "BSX", "MDT", "EW", "IDXX", "DXCM", "ALGN", "HCA", "UHS", "DGX", "LH",
    "CI", "HUM", "CNC", "MOH", "ELV", "CAH", "MCK", "VEEV",
    // Energy & Utilities
    "XOM", "CVX", "COP", "SLB", "EOG", "PSX", "MPC", "VLO", "OXY", "HAL",
    "BKR", "NOV", "DVN", "FANG", "APA", "KMI", "WMB", "NEE", "DUK", "SO",
    "D", "AEP", "EXC", "SRE", "PEG", "XEL", "ED",
    // Industrials & Aerospace
    "BA", "CAT", "GE", "HON", "UPS", "FDX", "UNP", "CSX", "NSC", "LUV",
    "DAL", "AAL", "UAL", "RTX", "LMT", "NOC", "GD", "LHX", "TDG", "HWM",
    "DE", "EMR", "ITW", "ETN", "PH", "ROK", "AME", "DOV", "IR", "CARR",
    // Materials & Chemicals
    "LIN", "APD", "ECL", "SHW", "DD", "DOW", "PPG", "NEM", "FCX", "GOLD",
    "NUE", "STLD", "RS", "VMC", "MLM", "ALB", "FMC", "CE", "CF", "MOS",
    // Telecom & Media
    "T", "VZ", "TMUS", "CMCSA", "DIS", "NFLX", "WBD", "FOXA", "SPOT", "RBLX",
    "EA", "TTWO", "U", "MTCH", "BMBL", "SNAP", "PINS", "TWLO",
    // Semiconductors & Hardware
    "TSM", "ASML", "MPWR", "ON", "SWKS", "MCHP", "TER",
    // Retail & E-commerce
    "TGT", "DG", "DLTR", "ROST", "BBWI", "GPS", "AEO", "ANF", "FL", "DKS",
    "BBY", "FIVE", "OLLI", "BJ", "BIG", "TSCO",
    // International & Emerging
    "BABA", "JD", "BIDU", "NIO", "XPEV", "LI", "TME", "BILI",
    // ETFs
    "SPY", "QQQ", "IWM", "TLT",
    // REITs & Infrastructure
    "VTR", "ARE", "INVH", "MAA", "ESS", "UDR", "CPT", "AIV", "PEAK", "IRM",
];

/// Default tickers, duplicates removed, first occurrence order kept
pub fn default_universe() -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    UNIVERSE
        .iter()
        .filter(|t| seen.insert(**t))
        .map(|t| t.to_string())
        .collect()
}

/// Parse a comma or whitespace separated ticker list, uppercased and deduplicated
pub fn parse_tickers(input: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|t| t.trim().to_ascii_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
