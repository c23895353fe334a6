use crate::vfs::model::{VfsError, VfsResult};
use crate::vfs::path_normalizer::PathScrubber;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// 上传助手产出的原始字段，形状校验只在这里做一次
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UploadFields {
    #[validate(required, length(min = 1))]
    pub tmp_name: Option<String>,

    #[validate(required, length(min = 1))]
    pub name: Option<String>,
}

/// 已校验的上传载荷：临时文件路径 + 目标文件名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    temporary_path: PathBuf,
    destination_name: String,
}

impl UploadPayload {
    pub fn from_fields(tmp_name: Option<String>, name: Option<String>) -> VfsResult<Self> {
        UploadFields { tmp_name, name }.try_into()
    }

    pub fn temporary_path(&self) -> &Path {
        &self.temporary_path
    }

    pub fn destination_name(&self) -> &str {
        &self.destination_name
    }
}

impl TryFrom<UploadFields> for UploadPayload {
    type Error = VfsError;

    fn try_from(fields: UploadFields) -> Result<Self, Self::Error> {
        fields
            .validate()
            .map_err(|e| VfsError::InvalidArgument(format!("上传文件数组无效: {}", e)))?;

        let (Some(tmp_name), Some(name)) = (fields.tmp_name, fields.name) else {
            return Err(VfsError::InvalidArgument("上传文件数组无效".to_string()));
        };

        // 目标名只取最后一段
        let destination_name = PathScrubber::basename(&name).ok_or_else(|| {
            VfsError::InvalidArgument(format!("上传目标文件名无效: {}", name))
        })?;

        Ok(Self {
            temporary_path: PathBuf::from(tmp_name),
            destination_name,
        })
    }
}
