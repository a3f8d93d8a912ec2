use std::hint::black_box;

use bencher::{BASE_URL, test_cases};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use micro_call::call::{Call, CallFactory};
use micro_call::client::Client;
use micro_call::protocol::{Request, Response, TransportError};
use micro_call::timeout::Timeout;
use micro_call::transport::transport_fn;
use micro_service::{BaseUrl, RequestFactory};

fn benchmark_parse(criterion: &mut Criterion) {
    let base_url = BaseUrl::parse(BASE_URL).expect("base url should be valid");
    let mut group = criterion.benchmark_group("request_factory_parse");

    for case in test_cases() {
        let metadata = case.method();
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &metadata, |b, metadata| {
            b.iter(|| black_box(RequestFactory::parse(&base_url, metadata).expect("metadata should be valid")));
        });
    }

    group.finish();
}

fn benchmark_create(criterion: &mut Criterion) {
    let base_url = BaseUrl::parse(BASE_URL).expect("base url should be valid");
    let mut group = criterion.benchmark_group("request_factory_create");

    for case in test_cases() {
        let factory = RequestFactory::parse(&base_url, &case.method()).expect("metadata should be valid");
        let arguments = case.arguments();
        group.bench_with_input(BenchmarkId::new(format!("{:?}", case.group()), case.name()), &arguments, |b, arguments| {
            b.iter(|| black_box(factory.create(arguments).expect("arguments should bind")));
        });
    }

    group.finish();
}

fn benchmark_execute(criterion: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().expect("runtime should build");
    let client = runtime.block_on(async {
        Client::builder()
            .transport(transport_fn(|request: Request, _timeout: Timeout| async move {
                Response::builder(request).status(204_u16).body(()).map_err(TransportError::protocol)
            }))
            .build()
            .expect("client should build")
    });
    let request = Request::builder().uri("https://api.example.test/v1/ping").build().expect("request should be valid");

    criterion.bench_function("call_execute", |b| {
        b.iter_batched(
            || client.new_call(request.clone()),
            |call| runtime.block_on(async move { black_box(call.execute().await.expect("exchange should succeed")) }),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(service, benchmark_parse, benchmark_create, benchmark_execute);
criterion_main!(service);
