use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;

use crate::error::BlockError;
use crate::registry::Registry;

pub mod cloudformation;
pub mod cloudfront;
pub mod cloudwatch;
pub mod ec2;
pub mod kms;
pub mod s3;
pub mod sts;

pub fn register_all(registry: &mut Registry) {
    registry.register(cloudfront::GetInvalidation);
    registry.register(cloudfront::CreateInvalidation);
    registry.register(kms::Encrypt);
    registry.register(kms::Decrypt);
    registry.register(cloudformation::DescribeStacks);
    registry.register(ec2::DescribeInstances);
    registry.register(cloudwatch::GetMetricStatistics);
    registry.register(cloudwatch::PutMetricData);
    registry.register(s3::ListObjectsV2);
    registry.register(s3::GetObject);
    registry.register(sts::GetCallerIdentity);
}

/// Binary fields travel through events as standard base64.
pub fn decode_blob(field: &str, value: &str) -> Result<Bytes, BlockError> {
    STANDARD
        .decode(value)
        .map(Bytes::from)
        .map_err(|e| BlockError::InvalidInput(format!("{} is not valid base64: {}", field, e)))
}
