//! Tests against a running Redis, enable them with `--features integration-tests`. The server is
//! taken from `RELQ_TEST_URL`, default is the local one.
mod helper;
mod redis;
