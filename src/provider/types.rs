//! # 上游响应类型
//!
//! 上游 `main_dashboard_data` 接口的响应结构。数值字段既可能是 JSON 数字也可能是数字字符串。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::error::ProviderError;

/// 上游原始响应外壳
#[derive(Debug, Clone, Deserialize)]
pub struct RawProviderResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

const fn default_success() -> bool {
    true
}

impl RawProviderResponse {
    /// 转换为结构化快照
    ///
    /// `success: false` 视为业务拒绝；缺失 `data`、`total_sales` 不是数字或数值非有限时视为格式错误。
    pub fn into_snapshot(self) -> Result<DashboardSnapshot, ProviderError> {
        if !self.success {
            return Err(ProviderError::Rejected {
                message: self
                    .message
                    .unwrap_or_else(|| "provider reported success=false".to_string()),
            });
        }

        let data = match self.data {
            Some(Value::Object(map)) => Value::Object(map),
            Some(other) => {
                return Err(ProviderError::malformed(format!(
                    "`data` must be an object, got {}",
                    json_type_name(&other)
                )));
            }
            None => return Err(ProviderError::malformed("missing `data` field")),
        };

        let snapshot: DashboardSnapshot =
            serde_json::from_value(data).map_err(|e| ProviderError::malformed(e.to_string()))?;
        snapshot.ensure_finite()?;
        Ok(snapshot)
    }
}

/// 单个日期区间的仪表盘汇总数据
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub total_sales: f64,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub total_revenue: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub sales_count: Option<u64>,
    /// 按实体拆分的明细，原样保留
    #[serde(default)]
    pub cards: Map<String, Value>,
    /// 上游返回的其他字段
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DashboardSnapshot {
    /// 仅有销售额的快照
    #[must_use]
    pub fn with_total(total_sales: f64) -> Self {
        Self {
            total_sales,
            total_revenue: None,
            sales_count: None,
            cards: Map::new(),
            extra: Map::new(),
        }
    }

    /// 数字字符串可能解析出 `NaN`、`inf`，不能进入合计
    fn ensure_finite(&self) -> Result<(), ProviderError> {
        let fields = [
            ("total_sales", Some(self.total_sales)),
            ("total_revenue", self.total_revenue),
        ];
        for (field, value) in fields {
            if let Some(value) = value.filter(|v| !v.is_finite()) {
                return Err(ProviderError::malformed(format!(
                    "`{field}` must be a finite number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// 作为 `details` 输出的 JSON
    #[must_use]
    pub fn to_details(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
