use criterion::{black_box, criterion_group, criterion_main, Criterion};

use svctop::aggregate::Aggregator;
use svctop::report::build_top_n;
use svctop::services::ServiceDirectory;

fn directory() -> ServiceDirectory {
    let mut text = String::new();
    for port in 1..1024u16 {
        text.push_str(&format!("TCP,{port},svc-tcp-{port}\nUDP,{port},svc-udp-{port}\n"));
    }
    ServiceDirectory::from_reader(text.as_bytes()).unwrap()
}

fn flow_lines(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let proto = if i % 3 == 0 { "UDP" } else { "TCP" };
            let server = (i * 7 % 2048) as u16 + 1;
            format!("{proto},{},{server},{},{}", 30000 + i % 30000, i % 50 + 1, i % 9000 + 64)
        })
        .collect()
}

fn ingest(c: &mut Criterion) {
    let dir = directory();
    let lines = flow_lines(10_000);
    c.bench_function("ingest 10k flow lines", |b| {
        b.iter(|| {
            let mut agg = Aggregator::new(&dir);
            for line in &lines {
                agg.ingest_line(black_box(line));
            }
            agg.totals().bytes
        })
    });
}

fn top_n(c: &mut Criterion) {
    let dir = directory();
    let mut agg = Aggregator::new(&dir);
    for line in flow_lines(10_000) {
        agg.ingest_line(&line);
    }
    c.bench_function("top 10 report", |b| b.iter(|| build_top_n(black_box(agg.services()), 10)));
}

criterion_group!(benches, ingest, top_n);
criterion_main!(benches);
