pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

pub fn feed() -> LogCtx<ops::feed::Feed> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn like() -> LogCtx<ops::like::Like> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn auth() -> LogCtx<ops::auth::Auth> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn search() -> LogCtx<ops::search::Search> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn tags() -> LogCtx<ops::tags::Tags> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn browse() -> LogCtx<ops::browse::Browse> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
