pub mod domain {
    use std::fmt;

    /// Lookup key of the service directory.
    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ServiceKey {
        pub protocol: String,
        pub port: u16,
    }

    impl ServiceKey {
        pub fn new(protocol: impl Into<String>, port: u16) -> Self {
            ServiceKey {
                protocol: protocol.into(),
                port,
            }
        }
    }

    impl fmt::Display for ServiceKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}/{}", self.protocol, self.port)
        }
    }

    /// One flow (or one captured packet) as handed over by a record source.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FlowRecord {
        pub protocol: String,
        pub src_port: u16,
        pub dst_port: u16,
        pub packets: u64,
        pub bytes: u64,
    }

    /// Packet and byte counters. They only ever grow.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct FlowStats {
        pub packet_count: u64,
        pub byte_count: u64,
    }

    impl FlowStats {
        pub fn add(&mut self, packets: u64, bytes: u64) {
            self.packet_count = self.packet_count.saturating_add(packets);
            self.byte_count = self.byte_count.saturating_add(bytes);
        }

        pub fn merge(&mut self, other: &FlowStats) {
            self.add(other.packet_count, other.byte_count);
        }
    }
}

pub mod dto {
    use serde::Serialize;

    use super::domain::{FlowStats, ServiceKey};

    #[derive(Debug, Serialize, Clone, PartialEq, Eq)]
    pub struct ServiceRow {
        pub service: String,
        pub packets: u64,
        pub bytes: u64,
    }

    impl ServiceRow {
        pub fn new(service: impl Into<String>, stats: &FlowStats) -> Self {
            ServiceRow {
                service: service.into(),
                packets: stats.packet_count,
                bytes: stats.byte_count,
            }
        }
    }

    #[derive(Debug, Serialize, Clone, PartialEq, Eq)]
    pub struct UnrecognizedRow {
        pub protocol: String,
        pub port: u16,
        pub packets: u64,
        pub bytes: u64,
    }

    impl UnrecognizedRow {
        pub fn new(key: &ServiceKey, stats: &FlowStats) -> Self {
            UnrecognizedRow {
                protocol: key.protocol.clone(),
                port: key.port,
                packets: stats.packet_count,
                bytes: stats.byte_count,
            }
        }
    }

    #[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
    pub struct RunTotals {
        pub records: u64,
        pub parse_failures: u64,
        pub packets: u64,
        pub bytes: u64,
    }

    /// Everything `--json` writes.
    #[derive(Debug, Serialize, Clone)]
    pub struct JsonReport {
        pub top_n: i64,
        pub services: Vec<ServiceRow>,
        pub other: Option<ServiceRow>,
        pub unrecognized: Vec<UnrecognizedRow>,
        pub totals: RunTotals,
    }
}
