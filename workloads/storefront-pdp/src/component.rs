//! Spin HTTP entry point.

use anyhow::anyhow;
use chrono::Utc;
use futures::SinkExt;
use spin_sdk::http::{Fields, IncomingRequest, OutgoingResponse, ResponseOutparam};
use spin_sdk::http_component;

use edge_sdk::edge_core::{Method, RequestContext};
use edge_sdk::edge_data::{FetchClient, SpinTransport};
use edge_sdk::edge_observability::{MetricsCollector, RenderMode, StructuredLogger};
use edge_sdk::edge_security::{ContentSecurityPolicy, Nonce};
use edge_sdk::edge_streaming::StreamingSink;

use crate::api::{self, ApiResponse};
use crate::bot::is_bot;
use crate::config::StorefrontConfig;
use crate::csp::{build_policy, fallback_policy, policy_header};
use crate::page::{error_page, load_page, page_shell, render_sections, stream_page, PageRequest};
use crate::{handler, manifest, outbound_allowlist, WORKLOAD_NAME};

const HTML: &str = "text/html; charset=utf-8";
const JSON: &str = "application/json";

type HeaderList = Vec<(String, Vec<u8>)>;

#[http_component]
async fn handle(req: IncomingRequest, response_out: ResponseOutparam) {
    let path_with_query = req.path_with_query().unwrap_or_else(|| "/".to_string());
    let method = convert_method(&req.method());

    let mut ctx = RequestContext::new(method.unwrap_or(Method::Get), &path_with_query);
    for name in ["user-agent", "content-type"] {
        if let Some(value) = header(&req, name) {
            ctx = ctx.with_header(name, value);
        }
    }

    let logger = StructuredLogger::new(ctx.request_id.clone())
        .with_workload(WORKLOAD_NAME)
        .with_route(&ctx.path);

    let config = match StorefrontConfig::from_spin() {
        Ok(config) => config,
        Err(err) => {
            logger
                .error("invalid configuration")
                .field("error", format!("{:#}", err))
                .emit();
            let policy = fallback_policy(Nonce::generate());
            let body = error_page(500, "Something went wrong").into_bytes();
            send(response_out, 500, html_headers(&ctx, &policy), body, &logger).await;
            return;
        }
    };
    let policy = build_policy(&config, Nonce::generate());

    let Some(method) = method else {
        let body = error_page(404, "Page not found").into_bytes();
        send(response_out, 404, html_headers(&ctx, &policy), body, &logger).await;
        return;
    };

    let route = match manifest().resolve(method, &ctx.path) {
        Ok(route) => route,
        Err(err) => {
            logger.info("no route").error(&err).emit();
            let status = err.status().as_u16();
            let body = error_page(status, "Page not found").into_bytes();
            send(response_out, status, html_headers(&ctx, &policy), body, &logger).await;
            return;
        }
    };
    ctx = ctx.with_params(route.params);

    let fetch = FetchClient::new(SpinTransport, ctx.request_id.clone(), outbound_allowlist(&config));

    let response = match route.handler.as_str() {
        handler::PRODUCT => {
            product(&ctx, &config, &policy, &fetch, &logger, response_out).await;
            return;
        }
        handler::TRY_ON_SUBMIT => match req.into_body().await {
            Ok(body) => api::submit(&fetch, &config, ctx.header("content-type"), body, &logger).await,
            Err(err) => {
                logger
                    .warn("request body unreadable")
                    .field("error", format!("{:?}", err))
                    .emit();
                ApiResponse {
                    status: 400,
                    body: None,
                }
            }
        },
        handler::TRY_ON_STATUS => {
            api::status(&fetch, &config, ctx.param("request_id").unwrap_or_default(), &logger).await
        }
        handler::TRY_ON_CANCEL => {
            api::cancel(&fetch, &config, ctx.param("request_id").unwrap_or_default(), &logger).await
        }
        other => {
            logger.error("unhandled route").field("handler", other).emit();
            ApiResponse {
                status: 500,
                body: None,
            }
        }
    };

    let body = response.body_bytes();
    send(response_out, response.status, base_headers(&ctx, JSON), body, &logger).await;
}

async fn product(
    ctx: &RequestContext,
    config: &StorefrontConfig,
    policy: &ContentSecurityPolicy,
    fetch: &FetchClient<SpinTransport>,
    logger: &StructuredLogger,
    response_out: ResponseOutparam,
) {
    let handle = ctx.param("handle").unwrap_or_default();
    let bot = is_bot(ctx.header("user-agent"));

    let mut metrics = MetricsCollector::new(ctx.request_id.clone());
    metrics.set_route(&ctx.path);
    metrics.set_render_mode(if bot {
        RenderMode::Buffered
    } else {
        RenderMode::Streamed
    });

    let loaded = match load_page(fetch, config, handle, &ctx.query, logger, &mut metrics).await {
        Ok(loaded) => loaded,
        Err(err) => {
            let (status, message) = if err.is_not_found() {
                (404, "Product not found")
            } else {
                (500, "Something went wrong")
            };
            logger
                .error("product page failed")
                .field("status", status)
                .error(&err)
                .emit();
            let body = error_page(status, message).into_bytes();
            send(response_out, status, html_headers(ctx, policy), body, logger).await;
            return;
        }
    };

    let nonce = policy.nonce().as_str().to_string();
    let request = PageRequest {
        path: &ctx.path,
        query: &ctx.query,
        nonce: &nonce,
        now: Utc::now(),
    };
    let sections = render_sections(&loaded, &request, config);
    let shell = page_shell(&loaded, config, &ctx.path, &nonce);

    let headers = html_headers(ctx, policy);

    if bot {
        let mut buffered = StreamingSink::new(Vec::<Vec<u8>>::new(), ctx.timing.clone());
        if let Err(err) = stream_page(&mut buffered, &shell, &sections, &mut metrics).await {
            logger.error("render failed").error(&err).emit();
        }
        let body = buffered.into_inner().concat();
        send(response_out, 200, headers, body, logger).await;
    } else {
        let response = match outgoing(200, &headers) {
            Ok(response) => response,
            Err(err) => {
                logger.error("response rejected").field("error", err).emit();
                return;
            }
        };
        let body = response.take_body();
        response_out.set(response);

        let mut sink = StreamingSink::new(body, ctx.timing.clone());
        if let Err(err) = stream_page(&mut sink, &shell, &sections, &mut metrics).await {
            logger.error("stream failed").error(&err).emit();
        }
        for section in sink.sections_sent() {
            if let Some(duration) = sink.timing().section_duration(section) {
                logger
                    .debug("section sent")
                    .field("section", section)
                    .duration_ms("duration_ms", duration)
                    .emit();
            }
        }
    }

    let metrics = metrics.finalize(200);
    logger
        .info("product page complete")
        .field_bool("bot", bot)
        .emit();
    eprintln!("{}", metrics.to_summary());
}

fn base_headers(ctx: &RequestContext, content_type: &str) -> HeaderList {
    vec![
        ("content-type".to_string(), content_type.as_bytes().to_vec()),
        ("x-request-id".to_string(), ctx.request_id.to_string().into_bytes()),
    ]
}

fn html_headers(ctx: &RequestContext, policy: &ContentSecurityPolicy) -> HeaderList {
    let mut headers = base_headers(ctx, HTML);
    headers.push(policy_header(policy));
    headers
}

fn outgoing(status: u16, headers: &HeaderList) -> anyhow::Result<OutgoingResponse> {
    let fields =
        Fields::from_list(headers).map_err(|e| anyhow!("invalid response headers: {:?}", e))?;
    let response = OutgoingResponse::new(fields);
    response
        .set_status_code(status)
        .map_err(|_| anyhow!("invalid status code {}", status))?;
    Ok(response)
}

/// Write a complete, non-streamed response.
async fn send(
    response_out: ResponseOutparam,
    status: u16,
    headers: HeaderList,
    body: Vec<u8>,
    logger: &StructuredLogger,
) {
    let response = match outgoing(status, &headers) {
        Ok(response) => response,
        Err(err) => {
            logger.error("response rejected").field("error", err).emit();
            return;
        }
    };
    let mut sink = response.take_body();
    response_out.set(response);
    if body.is_empty() {
        return;
    }
    if let Err(err) = sink.send(body).await {
        logger
            .error("response write failed")
            .field("error", format!("{:?}", err))
            .emit();
    }
}

fn header(req: &IncomingRequest, name: &str) -> Option<String> {
    req.headers()
        .get(&name.to_string())
        .into_iter()
        .next()
        .and_then(|value| String::from_utf8(value).ok())
}

fn convert_method(method: &spin_sdk::http::Method) -> Option<Method> {
    use spin_sdk::http::Method as SpinMethod;

    match method {
        SpinMethod::Get => Some(Method::Get),
        SpinMethod::Post => Some(Method::Post),
        SpinMethod::Put => Some(Method::Put),
        SpinMethod::Delete => Some(Method::Delete),
        SpinMethod::Patch => Some(Method::Patch),
        SpinMethod::Head => Some(Method::Head),
        SpinMethod::Options => Some(Method::Options),
        _ => None,
    }
}
