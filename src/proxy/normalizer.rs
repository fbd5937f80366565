//! Normalizer for scraped proxy listings
//!
//! Each listing site pastes into a different text layout. Every parser here
//! turns one layout into canonical `http://<ip>:<port>` endpoints:
//! - free-proxy-list.net: one record per line, whitespace separated,
//!   transparent proxies dropped
//! - freeproxylists.net: one record per line, whitespace separated
//! - hidemy.name: one record per 4 lines
//! - proxylist.hidemyass.com: one record per 2 lines, tab separated with a
//!   leading offset column

use crate::config::PipelineConfig;
use crate::error::SiftError;
use crate::proxy::models::{Endpoint, Scheme};
use crate::proxy::store;
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use tracing::{info, warn};

/// Matches a dotted-quad host; octet ranges are checked separately
static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").expect("Invalid IPv4 regex")
});

/// The listing layouts the normalizer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    FreeProxyListNet,
    FreeProxyListsNet,
    HidemyName,
    ProxylistHidemyassCom,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 4] = [
        SourceFormat::FreeProxyListNet,
        SourceFormat::FreeProxyListsNet,
        SourceFormat::HidemyName,
        SourceFormat::ProxylistHidemyassCom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::FreeProxyListNet => "free-proxy-list.net",
            SourceFormat::FreeProxyListsNet => "freeproxylists.net",
            SourceFormat::HidemyName => "hidemy.name",
            SourceFormat::ProxylistHidemyassCom => "proxylist.hidemyass.com",
        }
    }

    pub fn parse(self, raw: &str) -> Vec<Endpoint> {
        match self {
            SourceFormat::FreeProxyListNet => parse_free_proxy_list_net(raw),
            SourceFormat::FreeProxyListsNet => parse_freeproxylists_net(raw),
            SourceFormat::HidemyName => parse_hidemy_name(raw),
            SourceFormat::ProxylistHidemyassCom => parse_proxylist_hidemyass_com(raw),
        }
    }

    /// Raw listing file name for this source in the pipeline layout
    pub fn file_name(self, config: &PipelineConfig) -> &str {
        match self {
            SourceFormat::FreeProxyListNet => &config.free_proxy_list_net_file,
            SourceFormat::FreeProxyListsNet => &config.freeproxylists_net_file,
            SourceFormat::HidemyName => &config.hidemy_name_file,
            SourceFormat::ProxylistHidemyassCom => &config.proxylist_hidemyass_com_file,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// free-proxy-list.net: `ip port code country anonymity ...` per line.
/// Lines mentioning `transparent` are skipped.
pub fn parse_free_proxy_list_net(raw: &str) -> Vec<Endpoint> {
    lines(raw)
        .into_iter()
        .filter(|line| !line.contains("transparent"))
        .filter_map(|line| whitespace_record(line, SourceFormat::FreeProxyListNet))
        .collect()
}

/// freeproxylists.net: `ip port ...` per line
pub fn parse_freeproxylists_net(raw: &str) -> Vec<Endpoint> {
    lines(raw)
        .into_iter()
        .filter_map(|line| whitespace_record(line, SourceFormat::FreeProxyListsNet))
        .collect()
}

/// hidemy.name: every record is spread over four lines
pub fn parse_hidemy_name(raw: &str) -> Vec<Endpoint> {
    lines(raw)
        .chunks(4)
        .filter_map(|chunk| whitespace_record(&chunk.join(" "), SourceFormat::HidemyName))
        .collect()
}

/// proxylist.hidemyass.com: every record is spread over two lines and is
/// tab separated; column 0 is an offset, columns 1 and 2 are ip and port
pub fn parse_proxylist_hidemyass_com(raw: &str) -> Vec<Endpoint> {
    lines(raw)
        .chunks(2)
        .filter_map(|chunk| {
            let record = chunk.join(" ");
            let fields: Vec<&str> = record.split('\t').collect();
            match (fields.get(1), fields.get(2)) {
                (Some(host), Some(port)) => {
                    build_endpoint(host, port, SourceFormat::ProxylistHidemyassCom)
                }
                _ => skip(&record, SourceFormat::ProxylistHidemyassCom),
            }
        })
        .collect()
}

/// Sorted union of several parsed sources, duplicates removed
pub fn merge_sources<I>(sources: I) -> Vec<Endpoint>
where
    I: IntoIterator<Item = Vec<Endpoint>>,
{
    sources
        .into_iter()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Parse every source file present in the pipeline's data directory and
/// merge them. Unreadable source files are skipped, but at least one must
/// be read.
pub fn normalize_sources(config: &PipelineConfig) -> std::result::Result<Vec<Endpoint>, SiftError> {
    let mut parsed = Vec::new();
    let mut first_failure = None;

    for format in SourceFormat::ALL {
        let path = config.source_path(format.file_name(config));
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let endpoints = format.parse(&raw);
                info!(source = %format, count = endpoints.len(), "parsed listing");
                parsed.push(endpoints);
            }
            Err(e) => {
                warn!(source = %format, path = ?path, "skipping listing: {}", e);
                first_failure.get_or_insert((path, e));
            }
        }
    }

    match (parsed.is_empty(), first_failure) {
        (true, Some((path, e))) => Err(SiftError::load(path, e)),
        _ => Ok(merge_sources(parsed)),
    }
}

/// Normalize the pipeline's sources and write the merged list to its
/// storage location
pub fn normalize_into_storage(config: &PipelineConfig) -> Result<Vec<Endpoint>> {
    let endpoints = normalize_sources(config)?;
    let path = config.merged_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| SiftError::persist(dir, e))?;
    }
    store::save_endpoints(&endpoints, &path)?;
    Ok(endpoints)
}

/// Non-empty lines of a trimmed listing
fn lines(raw: &str) -> Vec<&str> {
    raw.trim()
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

fn whitespace_record(record: &str, format: SourceFormat) -> Option<Endpoint> {
    let mut fields = record.split_whitespace();
    match (fields.next(), fields.next()) {
        (Some(host), Some(port)) => build_endpoint(host, port, format),
        _ => skip(record, format),
    }
}

fn build_endpoint(host: &str, port: &str, format: SourceFormat) -> Option<Endpoint> {
    let host = host.trim();
    let port = port.trim();
    match port.parse::<u16>() {
        Ok(port) if port != 0 && is_ipv4(host) => Some(Endpoint::new(Scheme::Http, host, port)),
        _ => skip(&format!("{} {}", host, port), format),
    }
}

fn is_ipv4(host: &str) -> bool {
    IPV4_REGEX.captures(host).is_some_and(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .all(|octet| octet.as_str().parse::<u8>().is_ok())
    })
}

fn skip(record: &str, format: SourceFormat) -> Option<Endpoint> {
    warn!(source = %format, record, "skipping malformed record");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(endpoints: &[Endpoint]) -> Vec<&str> {
        endpoints.iter().map(|e| e.as_str()).collect()
    }

    #[test]
    fn test_free_proxy_list_net_drops_transparent() {
        let raw = "\
1.2.3.4 8080 US United States transparent no no 1 minute ago
5.6.7.8 3128 DE Germany elite proxy no yes 2 minutes ago
";
        let endpoints = parse_free_proxy_list_net(raw);
        assert_eq!(strings(&endpoints), vec!["http://5.6.7.8:3128"]);
    }

    #[test]
    fn test_freeproxylists_net() {
        let raw = "10.0.0.1 80 HTTP anonymous\n10.0.0.2 8080 HTTPS elite\n";
        let endpoints = parse_freeproxylists_net(raw);
        assert_eq!(
            strings(&endpoints),
            vec!["http://10.0.0.1:80", "http://10.0.0.2:8080"]
        );
    }

    #[test]
    fn test_hidemy_name_groups_four_lines() {
        let raw = "\
91.1.1.1
3128
Russia Moscow
120 ms HTTP High
92.2.2.2
8000
Brazil
300 ms HTTPS Low
";
        let endpoints = parse_hidemy_name(raw);
        assert_eq!(
            strings(&endpoints),
            vec!["http://91.1.1.1:3128", "http://92.2.2.2:8000"]
        );
    }

    #[test]
    fn test_proxylist_hidemyass_com_uses_offset_columns() {
        let raw = "1 min\t45.1.2.3\t8080\tUS\n\tHTTP\tHigh\n2 min\t46.1.2.3\t3128\tFR\n\tHTTPS\tLow\n";
        let endpoints = parse_proxylist_hidemyass_com(raw);
        assert_eq!(
            strings(&endpoints),
            vec!["http://45.1.2.3:8080", "http://46.1.2.3:3128"]
        );
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let raw = "IP Address Port Code\n1.2.3.4 notaport\n300.1.1.1 80\n1.2.3.4\n7.7.7.7 8080\n";
        let endpoints = parse_freeproxylists_net(raw);
        assert_eq!(strings(&endpoints), vec!["http://7.7.7.7:8080"]);
    }

    #[test]
    fn test_empty_listing() {
        assert!(parse_free_proxy_list_net("").is_empty());
        assert!(parse_hidemy_name("\n\n").is_empty());
        assert!(parse_proxylist_hidemyass_com("   ").is_empty());
    }

    #[test]
    fn test_merge_sources_sorts_and_deduplicates() {
        let a = vec![
            Endpoint::from("http://5.6.7.8:3128"),
            Endpoint::from("http://1.2.3.4:8080"),
        ];
        let b = vec![
            Endpoint::from("http://1.2.3.4:8080"),
            Endpoint::from("http://2.2.2.2:80"),
        ];
        let merged = merge_sources([a, b]);
        assert_eq!(
            strings(&merged),
            vec![
                "http://1.2.3.4:8080",
                "http://2.2.2.2:80",
                "http://5.6.7.8:3128"
            ]
        );
    }

    #[test]
    fn test_source_format_dispatch() {
        assert_eq!(SourceFormat::ALL.len(), 4);
        assert_eq!(SourceFormat::HidemyName.to_string(), "hidemy.name");
        let config = PipelineConfig::default();
        assert_eq!(
            SourceFormat::FreeProxyListNet.file_name(&config),
            "new_proxies.free-proxy-list.net.txt"
        );
        assert_eq!(
            strings(&SourceFormat::FreeProxyListsNet.parse("8.8.8.8 53")),
            vec!["http://8.8.8.8:53"]
        );
    }

    #[test]
    fn test_normalize_into_storage_skips_missing_sources() {
        let data = tempfile::tempdir().unwrap();
        let storage = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default()
            .with_data_dir(data.path())
            .with_storage_dir(storage.path().join("nested"));

        fs::write(
            data.path().join(&config.free_proxy_list_net_file),
            "1.1.1.1 80 US x elite\n2.2.2.2 81 US x transparent\n",
        )
        .unwrap();
        fs::write(
            data.path().join(&config.freeproxylists_net_file),
            "3.3.3.3 82\n1.1.1.1 80\n",
        )
        .unwrap();

        let endpoints = normalize_into_storage(&config).unwrap();
        assert_eq!(
            strings(&endpoints),
            vec!["http://1.1.1.1:80", "http://3.3.3.3:82"]
        );

        let saved = fs::read_to_string(config.merged_path()).unwrap();
        assert_eq!(saved, "http://1.1.1.1:80\nhttp://3.3.3.3:82\n");
    }

    #[test]
    fn test_all_sources_missing_is_load_error() {
        let data = tempfile::tempdir().unwrap();
        let storage = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default()
            .with_data_dir(data.path())
            .with_storage_dir(storage.path());

        let err = normalize_sources(&config).unwrap_err();
        assert!(matches!(err, SiftError::Load { .. }));

        let err = normalize_into_storage(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SiftError>(),
            Some(SiftError::Load { .. })
        ));
        assert!(!config.merged_path().exists());
    }
}
