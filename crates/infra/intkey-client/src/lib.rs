#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod endpoints;
pub use endpoints::{ClientConfig, HttpEndpointClient, ServiceEndpointClient};

mod primitives;
pub use primitives::{
    ClientError, Operation, TransactionId, TransactionRequest, TransactionStatus,
};
