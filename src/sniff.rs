// src/sniff.rs
use std::path::Path;

use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use pcap::{Capture, Linktype, Offline};
use tracing::{debug, warn};

use crate::aggregate::Aggregator;
use crate::error::{Error, Result};
use crate::models::domain::FlowRecord;

const UNKNOWN: &str = "Unknown";
const OTHER_IP: &str = "OtherIP";

const IP_PROTO_ICMP: u8 = 1;
const IP_PROTO_GRE: u8 = 47;

const SLL_HEADER_LEN: usize = 16;
const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;

/// How frames in a capture file start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayer {
    Ethernet,
    RawIp,
    LinuxSll,
    Unsupported,
}

impl From<Linktype> for LinkLayer {
    fn from(link: Linktype) -> Self {
        match link {
            Linktype::ETHERNET => LinkLayer::Ethernet,
            Linktype::RAW | Linktype::IPV4 | Linktype::IPV6 => LinkLayer::RawIp,
            Linktype::LINUX_SLL => LinkLayer::LinuxSll,
            _ => LinkLayer::Unsupported,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub packets: u64,
    pub undecoded: u64,
}

/// Feeds every packet of a pcap/pcapng file into `aggregator`, each as a
/// one-packet flow.
pub fn start_reading(path: &Path, aggregator: &mut Aggregator<'_>) -> Result<CaptureSummary> {
    let mut cap = open_capture(path)?;
    let link = LinkLayer::from(cap.get_datalink());
    if link == LinkLayer::Unsupported {
        warn!(datalink = ?cap.get_datalink(), "unsupported link type, packets will count as Unknown");
    }
    debug!(path = %path.display(), ?link, "reading capture");

    Ok(process_packets(&mut cap, link, aggregator))
}

fn open_capture(path: &Path) -> Result<Capture<Offline>> {
    Capture::from_file(path).map_err(|source| Error::CaptureOpen {
        path: path.to_path_buf(),
        source,
    })
}

fn process_packets(cap: &mut Capture<Offline>, link: LinkLayer, aggregator: &mut Aggregator<'_>) -> CaptureSummary {
    let mut summary = CaptureSummary::default();
    loop {
        match cap.next_packet() {
            Ok(packet) => {
                let record = analyze_packet(link, packet.data);
                if record.protocol == UNKNOWN {
                    summary.undecoded += 1;
                }
                summary.packets += 1;
                aggregator.ingest(&record);
            }
            Err(pcap::Error::NoMorePackets) => break,
            Err(e) => {
                warn!("stopping capture read early: {}", e);
                break;
            }
        }
    }
    summary
}

/// Turns one captured frame into a flow record. Frames that cannot be
/// decoded still count, under protocol "Unknown" with both ports zero.
pub fn analyze_packet(link: LinkLayer, data: &[u8]) -> FlowRecord {
    let mut record = FlowRecord {
        protocol: UNKNOWN.into(),
        src_port: 0,
        dst_port: 0,
        packets: 1,
        bytes: data.len() as u64,
    };

    let sliced = match link {
        LinkLayer::Ethernet => SlicedPacket::from_ethernet(data).ok(),
        LinkLayer::RawIp => SlicedPacket::from_ip(data).ok(),
        LinkLayer::LinuxSll => sll_payload(data).and_then(|ip| SlicedPacket::from_ip(ip).ok()),
        LinkLayer::Unsupported => None,
    };

    if let Some(sliced) = sliced {
        if !handle_transport(sliced.transport.as_ref(), &mut record) {
            handle_ip(sliced.net.as_ref(), &mut record);
        }
    }
    record
}

fn sll_payload(data: &[u8]) -> Option<&[u8]> {
    if data.len() < SLL_HEADER_LEN {
        return None;
    }
    let proto = u16::from_be_bytes([data[14], data[15]]);
    matches!(proto, ETHERTYPE_IPV4 | ETHERTYPE_IPV6).then(|| &data[SLL_HEADER_LEN..])
}

fn handle_transport(transport: Option<&TransportSlice<'_>>, record: &mut FlowRecord) -> bool {
    let (protocol, src_port, dst_port) = match transport {
        Some(TransportSlice::Tcp(tcp)) => ("TCP", tcp.source_port(), tcp.destination_port()),
        Some(TransportSlice::Udp(udp)) => ("UDP", udp.source_port(), udp.destination_port()),
        _ => return false,
    };
    record.protocol = protocol.into();
    record.src_port = src_port;
    record.dst_port = dst_port;
    true
}

// Only IPv4 gets a protocol name; anything else stays Unknown.
fn handle_ip(net: Option<&NetSlice<'_>>, record: &mut FlowRecord) {
    if let Some(NetSlice::Ipv4(ipv4)) = net {
        record.protocol = match ipv4.header().protocol().0 {
            IP_PROTO_ICMP => "ICMP",
            IP_PROTO_GRE => "GRE",
            _ => OTHER_IP,
        }
        .into();
    }
}
