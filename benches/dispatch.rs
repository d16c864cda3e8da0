use criterion::{criterion_group, criterion_main, Criterion};
use handlr::{Endpoint, JsonWriter, PathParams, RequestContext, RequestHandler, Void};
use http::Request;
use serde::{Deserialize, Serialize};
use std::hint::black_box;

#[derive(Deserialize, handlr::Payload)]
struct Order {
    sku: String,
    quantity: u32,
}

#[derive(Default, handlr::Params)]
struct OrderParams {
    #[param(path = "store_id")]
    store_id: u64,
    #[param(query = "dry_run")]
    dry_run: bool,
}

#[derive(Serialize, handlr::Payload)]
struct Receipt {
    store_id: u64,
    sku: String,
    quantity: u32,
    dry_run: bool,
}

fn place_order(_ctx: &RequestContext, body: Order, p: OrderParams) -> anyhow::Result<Receipt> {
    Ok(Receipt {
        store_id: p.store_id,
        sku: body.sku,
        quantity: body.quantity,
        dry_run: p.dry_run,
    })
}

fn order_handler() -> RequestHandler {
    Endpoint::<Order, OrderParams, Receipt>::builder()
        .with_defaults()
        .with(JsonWriter)
        .build()
        .expect("valid endpoint")
        .into_handler(place_order)
}

fn order_request() -> Request<Vec<u8>> {
    let mut req = Request::post("/stores/17/orders?dry_run=true")
        .header("content-type", "application/json")
        .body(br#"{"sku":"ABC-123","quantity":3}"#.to_vec())
        .expect("valid request");
    req.extensions_mut()
        .insert(PathParams::from_iter([("store_id", "17")]));
    req
}

fn bench_dispatch(c: &mut Criterion) {
    let handler = order_handler();
    c.bench_function("dispatch_json_with_params", |b| {
        b.iter(|| {
            let res = handler(order_request());
            black_box(res);
        })
    });

    let ping = Endpoint::<Void, Void, Void>::builder()
        .build()
        .expect("void endpoint")
        .into_handler(|_ctx: &RequestContext, _b: Void, _p: Void| -> anyhow::Result<Void> {
            Ok(Void)
        });
    c.bench_function("dispatch_void", |b| {
        b.iter(|| {
            let res = ping(Request::new(Vec::new()));
            black_box(res);
        })
    });
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
