#![allow(dead_code)]

pub mod test_router {
    use handlr::{PathParams, RequestHandler};
    use http::{Method, Request, Response};

    /// Minimal segment router standing in for the application's router.
    ///
    /// Patterns use `{name}` captures; the captures are attached to the
    /// request as [`PathParams`] before the handler runs.
    #[derive(Default)]
    pub struct TestRouter {
        routes: Vec<(String, RequestHandler)>,
    }

    impl TestRouter {
        pub fn new() -> Self {
            Self::default()
        }

        /// A `mount` function for `handlr::handle` / `Endpoint::handle`.
        pub fn mount(&mut self) -> impl FnOnce(&str, RequestHandler) + '_ {
            move |path: &str, handler: RequestHandler| {
                self.routes.push((path.to_string(), handler));
            }
        }

        pub fn len(&self) -> usize {
            self.routes.len()
        }

        pub fn call(&self, req: Request<Vec<u8>>) -> Response<Vec<u8>> {
            let path = req.uri().path().to_string();
            for (pattern, handler) in &self.routes {
                if let Some(params) = match_path(pattern, &path) {
                    let mut req = req;
                    req.extensions_mut().insert(params);
                    return handler(req);
                }
            }
            Response::builder()
                .status(404)
                .body(Vec::new())
                .expect("static response")
        }
    }

    fn match_path(pattern: &str, path: &str) -> Option<PathParams> {
        let pattern: Vec<&str> = pattern.trim_matches('/').split('/').collect();
        let path: Vec<&str> = path.trim_matches('/').split('/').collect();
        if pattern.len() != path.len() {
            return None;
        }
        let mut params = PathParams::new();
        for (p, s) in pattern.iter().zip(path.iter()) {
            if let Some(name) = p.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                params.insert(name, *s);
            } else if p != s {
                return None;
            }
        }
        Some(params)
    }

    /// Build a request with optional headers.
    pub fn request(
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: impl Into<Vec<u8>>,
    ) -> Request<Vec<u8>> {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(body.into()).expect("valid test request")
    }

    pub fn body_str(res: &Response<Vec<u8>>) -> &str {
        std::str::from_utf8(res.body()).expect("utf-8 body")
    }
}
