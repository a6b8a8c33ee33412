//! Asset universe: categories of tickers.
//!
//! The ranker looks up each ticker's category to enforce the sector cap.
//! Tickers that no category lists fall into [`UNKNOWN_CATEGORY`] and are
//! never selected. A ticker listed under several categories belongs to the
//! last one that lists it.

use crate::domain::error::TitanError;
use crate::domain::price_table::{CloseSeries, PriceTable};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};

pub const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub tickers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Universe {
    categories: Vec<Category>,
    by_ticker: HashMap<String, usize>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("category name {0:?} is reserved")]
    ReservedCategory(String),
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

impl Universe {
    pub fn new(categories: Vec<Category>) -> Self {
        let mut by_ticker = HashMap::new();
        for (i, category) in categories.iter().enumerate() {
            for ticker in &category.tickers {
                by_ticker.insert(ticker.clone(), i);
            }
        }
        Universe {
            categories,
            by_ticker,
        }
    }

    /// The seven-category global catalog.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_CATEGORIES
                .iter()
                .map(|(name, tickers)| Category {
                    name: name.to_string(),
                    tickers: tickers.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
        )
    }

    /// Load `[universe]` entries (`Category Name = T1, T2, ...`), or the
    /// built-in catalog when the section is absent or empty.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TitanError> {
        let entries = config.get_entries("universe");
        if entries.is_empty() {
            return Ok(Self::builtin());
        }

        let mut categories = Vec::with_capacity(entries.len());
        for (name, value) in entries {
            let to_config_error =
                |e: UniverseError| TitanError::invalid("universe", &name, e.to_string());
            if name.eq_ignore_ascii_case(UNKNOWN_CATEGORY) {
                return Err(to_config_error(UniverseError::ReservedCategory(name.clone())));
            }
            let tickers = parse_tickers(&value).map_err(to_config_error)?;
            categories.push(Category { name, tickers });
        }
        Ok(Self::new(categories))
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_of(&self, ticker: &str) -> &str {
        self.by_ticker
            .get(ticker)
            .map(|&i| self.categories[i].name.as_str())
            .unwrap_or(UNKNOWN_CATEGORY)
    }

    /// Every distinct ticker, sorted.
    pub fn all_tickers(&self) -> Vec<String> {
        let unique: BTreeSet<&String> = self.by_ticker.keys().collect();
        unique.into_iter().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.by_ticker.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    FetchFailed { reason: String },
}

#[derive(Debug, Clone)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

pub struct UniversePrices {
    pub table: PriceTable,
    pub skipped: Vec<SkippedTicker>,
}

/// Fetch closes for every ticker and assemble them into one table.
///
/// Tickers that fail to load or have no rows are skipped with a warning;
/// it is an error only when nothing loads at all.
pub fn fetch_universe_prices(
    data_port: &dyn DataPort,
    tickers: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<UniversePrices, TitanError> {
    let mut series = Vec::with_capacity(tickers.len());
    let mut skipped = Vec::new();

    for ticker in tickers {
        let closes = match data_port.fetch_closes(ticker, start_date, end_date) {
            Ok(closes) => closes,
            Err(e) => {
                tracing::warn!(%ticker, error = %e, "skipping ticker");
                skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: SkipReason::FetchFailed {
                        reason: e.to_string(),
                    },
                });
                continue;
            }
        };

        if closes.is_empty() {
            tracing::warn!(%ticker, "skipping ticker (no data found)");
            skipped.push(SkippedTicker {
                ticker: ticker.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        tracing::debug!(%ticker, rows = closes.len(), "loaded");
        series.push(CloseSeries {
            ticker: ticker.clone(),
            closes,
        });
    }

    if series.is_empty() {
        return Err(TitanError::NoData {
            ticker: "all".to_string(),
        });
    }

    let table = PriceTable::from_series(series)?;
    Ok(UniversePrices { table, skipped })
}

const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Aggressive Growth",
        &[
            "TSLA", "NVDA", "AMD", "PLTR", "SHOP", "MELI", "SE", "DDOG", "NET", "SNOW", "CRWD",
            "ZS", "MDB", "ENPH", "SEDG", "FSLR", "ARKG", "ARKK", "ARKW", "ARKF", "SOXX", "SMH",
            "XBI", "IBB", "GNOM", "BITQ", "BLOK", "BITO", "KWEB", "CQQQ", "EMQQ", "IUIT.L",
            "EQQQ.L", "VUSA.L", "QDVE.DE", "VGWL.DE", "IS3N.DE", "SXR8.DE", "DFEN", "SOXL",
            "TQQQ", "TECL", "UPRO", "SPXL", "FAS", "LABU", "TNA", "NAIL", "BULZ", "FNGU", "WEBL",
            "DPST", "HIBL", "CURE", "DUSL", "RETL", "MIDU", "WANT", "PILL", "TPOR", "UTSL", "LIT",
            "REMX", "COPX", "URA", "URNM", "QCLN", "TAN", "FAN", "ICLN", "PBW", "CNRG", "ACES",
            "SMOG", "ERTH", "CTEC", "DRIV", "IDRV", "KARS", "SIL", "SILJ", "GDXJ", "GOAU",
            "RING", "SGDM", "SGDJ", "SLV", "PSLV", "SIVR", "GDX", "GLD", "IAU", "PHYS", "AAAU",
            "BAR", "SGOL", "OUNZ",
        ],
    ),
    (
        "Defense / Low Vol",
        &[
            "JNJ", "PG", "KO", "PEP", "MRK", "ABBV", "WMT", "COST", "CL", "UNP", "WM", "RSG",
            "ADP", "MMC", "ICE", "CME", "PAYX", "USMV", "SPLV", "NOBL", "SDY", "HDV", "DGRO",
            "VIG", "DVY", "SCHD", "SPHD", "FVD", "CDC", "LGLV", "XMLV", "XSLV", "LVHD", "SMMV",
            "EFAV", "ACWV", "JPIN", "JPUS", "EEMV", "IDLV", "ONEV", "FDLO", "VFMV", "AQWA",
            "NULV", "NUMV", "BLES", "ESGU", "SUSL", "SUSA", "KRMA", "SNPE", "DSI", "VSGX", "EAGG",
            "SUSB", "QQQA",
        ],
    ),
    (
        "Commodities",
        &[
            "DBC", "PDBC", "GSG", "COMT", "BCI", "FTGC", "DJP", "GCC", "RJI", "USCI", "CPER",
            "JJC", "DBB", "JJCTF", "USO", "BNO", "UNG", "UGA", "DBO", "CORN", "WEAT", "SOYB",
            "CANE", "NIB", "JO", "COW", "TAGS", "PDBA", "RJA", "MOO", "DBA", "VEGI", "WOOD",
            "CUT", "GUNR", "GNR", "PICK", "XME", "REMX", "SLX", "COPX", "LIT", "PPLT", "PALL",
            "GLTR", "CFD", "COMB",
        ],
    ),
    (
        "REITs",
        &[
            "VNQ", "VNQI", "SCHH", "IYR", "XLRE", "RWR", "USRT", "BBRE", "REET", "SRET", "REM",
            "MORT", "KBWY", "NURE", "HOMZ", "REZ", "INDS", "SRVR", "PPTY", "ICF", "FFR", "FREL",
            "DFAR", "IFGL", "WPS", "HAUZ", "RWO", "DRN", "TRET", "NETL", "CHIR", "GQRE", "SPRE",
            "ERET", "HIPS", "RFI", "APTS", "STOR", "OPEN", "LAND", "EPRT", "IIPR", "SAFE", "CTO",
            "AKR", "AAT", "JBGS",
        ],
    ),
    (
        "Global / Thematic",
        &[
            "VT", "ACWI", "VEU", "VXUS", "VWO", "EEM", "IEMG", "SCHE", "EWJ", "EWZ", "EWY", "EWT",
            "EWA", "EWC", "EWG", "EWU", "EWH", "EWS", "THD", "VNM", "INDA", "MCHI", "FM", "FRDM",
            "EWW", "EWP", "EIS", "TUR", "ECH", "ARGT", "AFK", "GXC", "FXI", "ASHR", "KBA", "CNYA",
            "FLCH", "NORW", "EDEN", "EFNL", "PGAL", "GREK", "EPOL", "ENZL", "EZA", "NGE", "PAK",
            "QAT", "UAE", "KSA", "FLSA", "FLKR", "FLGB", "FLJP", "FLGR", "FLIN", "FLBR", "FLMX",
            "FLTW", "FLAU", "FLCA", "FLHK", "JETS", "UFO", "HERO", "ESPO", "NERD", "BETZ", "AWAY",
            "GERM", "ROBO", "BOTZ", "IRBO", "ARKQ", "AIQ", "ROBT", "DTEC", "SNSR", "SKYY", "WCLD",
            "CLOU", "BUG", "HACK", "CIBR", "IHAK", "PRNT", "MOON", "KOMP", "LOUP", "BUZZ", "CHAT",
        ],
    ),
    (
        "Bonds / Hedges",
        &[
            "TLT", "IEF", "SHY", "AGG", "BND", "BNDX", "TIP", "STIP", "VTIP", "SCHP", "LTPZ",
            "GOVT", "VGSH", "VGIT", "VGLT", "SHV", "BIL", "SGOV", "TFLO", "FLOT", "FLRN", "SCHO",
            "SCHR", "SPTL", "SPLB", "SPAB", "IGSB", "IGIB", "LQD", "VCSH", "VCIT", "VCLT", "MUB",
            "TFI", "CMF", "NYF", "HYG", "JNK", "SHYG", "SJNK", "HYLB", "HYDB", "ANGL", "FALN",
            "BKLN", "SRLN", "EMB", "LEMB", "VWOB", "PCY", "EMHY", "IAGG", "BWX", "BNDW", "IGOV",
            "ISHG", "GVI", "TOTL", "BOND", "FBND", "NUBD", "FIXD", "GOVI", "FLCB", "JCPB", "MINT",
            "NEAR", "GSY", "ICSH", "JPST", "PULS", "FTSM", "RAVI", "CARY", "USFR",
        ],
    ),
    (
        "Crypto",
        &[
            "IBIT", "FBTC", "BITB", "ARKB", "BTCO", "EZBC", "BRRR", "HODL", "BTCW", "DEFI",
            "GBTC", "ETHE", "ETHA", "FETH", "ETHW", "ETHV", "CETH", "QETH", "EZET", "BITO", "BTF",
            "XBTF", "MAXI", "BITS", "BITQ", "BLOK", "DAPP", "CRPT", "SATO", "DAM", "IBLC",
        ],
    ),
];
