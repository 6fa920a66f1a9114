// Comma-separated line formats read by svctop.
//
//   services: protocol,port,service_name
//   flows:    protocol,src_port,dst_port,packets,bytes
//
// The last field of each format takes the rest of the line.

use std::str::FromStr;

use crate::error::ParseError;
use crate::models::domain::{FlowRecord, ServiceKey};

const SERVICE_FIELDS: usize = 3;
const FLOW_FIELDS: usize = 5;

/// Returns `None` for blank lines, which are not records at all.
pub fn parse_service_line(line: &str) -> Option<Result<(ServiceKey, String), ParseError>> {
    if line.trim().is_empty() {
        return None;
    }
    Some(service_entry(line))
}

fn service_entry(line: &str) -> Result<(ServiceKey, String), ParseError> {
    let fields = split_fields(line, SERVICE_FIELDS)?;
    let protocol = fields[0].trim();
    let port = number::<u16>("port", fields[1])?;
    let name = fields[2].trim();
    if name.is_empty() {
        return Err(ParseError::EmptyName);
    }
    Ok((ServiceKey::new(protocol, port), name.to_string()))
}

/// Returns `None` for blank lines, which are not records at all.
pub fn parse_flow_line(line: &str) -> Option<Result<FlowRecord, ParseError>> {
    if line.trim().is_empty() {
        return None;
    }
    Some(flow_record(line))
}

fn flow_record(line: &str) -> Result<FlowRecord, ParseError> {
    let fields = split_fields(line, FLOW_FIELDS)?;
    Ok(FlowRecord {
        protocol: fields[0].to_string(),
        src_port: number("src_port", fields[1])?,
        dst_port: number("dst_port", fields[2])?,
        packets: number("packets", fields[3])?,
        bytes: number("bytes", fields[4])?,
    })
}

fn split_fields(line: &str, expected: usize) -> Result<Vec<&str>, ParseError> {
    let fields: Vec<&str> = line.splitn(expected, ',').collect();
    if fields.len() < expected {
        return Err(ParseError::FieldCount {
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn number<T: FromStr>(field: &'static str, raw: &str) -> Result<T, ParseError> {
    raw.trim().parse().map_err(|_| ParseError::Number {
        field,
        value: raw.to_string(),
    })
}
