//! Rate limiting middleware.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use blogicum_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;

use crate::state::AppState;

/// Throttles requests per client address using the limiter in [`AppState`].
///
/// Passes everything through when the state carries no limiter.
pub struct RateLimitMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let (limiter, trust_proxy_headers) = req
            .app_data::<web::Data<AppState>>()
            .map(|state| (state.rate_limiter.clone(), state.trust_proxy_headers))
            .unwrap_or((None, false));

        let key = client_key(&req, trust_proxy_headers);

        Box::pin(async move {
            if let Some(limiter) = limiter {
                match limiter.check(&key).await {
                    Ok(result) if !result.allowed => {
                        tracing::warn!("Rate limit exceeded for key: {}", key);

                        let retry_after = result.retry_after.as_secs().max(1);
                        let error = ErrorResponse::new(429, "Too Many Requests").with_detail(
                            format!("Rate limit exceeded. Try again in {} seconds.", retry_after),
                        );
                        let response = HttpResponse::TooManyRequests()
                            .insert_header(("Retry-After", retry_after.to_string()))
                            .json(error);

                        let (http_req, _payload) = req.into_parts();
                        return Ok(
                            ServiceResponse::new(http_req, response).map_into_right_body()
                        );
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Rate limiter error, failing open: {}", e),
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// The client a request counts against.
///
/// Forwarding headers are client-controlled, so they are only read when the
/// deployment says a proxy sets them. The peer port is dropped so that new
/// connections from one host share a bucket.
fn client_key(req: &ServiceRequest, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(addr) = req.connection_info().realip_remote_addr() {
            return addr.to_string();
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_forwarded_for_ignored_unless_trusted() {
        let req = TestRequest::default()
            .peer_addr("10.0.0.7:51000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "203.0.113.9"))
            .to_srv_request();

        assert_eq!(client_key(&req, false), "10.0.0.7");
        assert_eq!(client_key(&req, true), "203.0.113.9");
    }

    #[test]
    fn test_missing_peer_shares_one_key() {
        let req = TestRequest::default().to_srv_request();
        assert_eq!(client_key(&req, false), "unknown");
    }
}
