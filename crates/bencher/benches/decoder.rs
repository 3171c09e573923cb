use bencher::{TestCase, TestFile};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use media_http::codec::RequestDecoder;
use media_http::connection::MessageParser;
use std::hint::black_box;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::Decoder;

static SMALL_HEADER: TestFile = TestFile::new("get_small.txt", include_str!("../resources/request/get_small.txt"));
static LARGE_HEADER: TestFile = TestFile::new("get_large.txt", include_str!("../resources/request/get_large.txt"));
static CHUNKED_POST: TestFile = TestFile::new("post_chunked.txt", include_str!("../resources/request/post_chunked.txt"));

fn benchmark_request_decoder(criterion: &mut Criterion) {
    let test_cases = [TestCase::whole("small_header_decoder", SMALL_HEADER), TestCase::whole("large_header_decoder", LARGE_HEADER)];
    let mut group = criterion.benchmark_group("request_decoder");

    for case in test_cases {
        group.throughput(Throughput::Bytes(case.file().content().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            let mut request_decoder = RequestDecoder::new();
            b.iter_batched_ref(
                || BytesMut::from(case.file().content()),
                |bytes_mut| {
                    let header = request_decoder.decode(bytes_mut).expect("input should be valid http request header").unwrap();
                    let body = request_decoder.decode(bytes_mut).expect("input should be valid http request body").unwrap();
                    black_box((header, body));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_message_parser(criterion: &mut Criterion) {
    let test_cases = [
        TestCase::whole("large_header_one_read", LARGE_HEADER),
        TestCase::fragmented("large_header_64_byte_reads", LARGE_HEADER, 64),
        TestCase::fragmented("large_header_1_byte_reads", LARGE_HEADER, 1),
        TestCase::fragmented("chunked_post_16_byte_reads", CHUNKED_POST, 16),
    ];
    let mut group = criterion.benchmark_group("message_parser");

    for case in test_cases {
        group.throughput(Throughput::Bytes(case.file().content().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter_batched(
                || (case.source(), MessageParser::with_capacity(case.read_size())),
                |(mut source, mut parser)| {
                    let message = parser.parse(&mut source).expect("input should be valid http request header");
                    let body = parser.body(&mut source).read_all().expect("input should be valid http request body");
                    black_box((message, body));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(decoder, benchmark_request_decoder, benchmark_message_parser);
criterion_main!(decoder);
