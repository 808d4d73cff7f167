use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::store::{DomainError, DomainResult, clean_optional, matches_keyword};

const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    Path,
    Query,
    Body,
}

impl ParamLocation {
    pub fn label_zh(self) -> &'static str {
        match self {
            ParamLocation::Path => "路径",
            ParamLocation::Query => "查询",
            ParamLocation::Body => "请求体",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiParamDoc {
    pub name: String,
    pub location: ParamLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiEndpointDoc {
    pub id: Uuid,
    pub method: String,
    pub path: String,
    pub summary: String,
    pub description: Option<String>,
    pub tag: String,
    pub params: Vec<ApiParamDoc>,
    pub sample_response: Option<Value>,
    pub deprecated: bool,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when documenting or re-documenting an endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEndpointInput {
    pub method: String,
    pub path: String,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tag: String,
    #[serde(default)]
    pub params: Vec<ApiParamDoc>,
    #[serde(default)]
    pub sample_response: Option<Value>,
    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub tag: String,
    pub count: usize,
}

#[derive(Default)]
pub struct ApiCatalog {
    endpoints: Vec<ApiEndpointDoc>,
}

impl ApiCatalog {
    pub fn list(&self, tag: Option<&str>, keyword: Option<&str>) -> Vec<ApiEndpointDoc> {
        let mut endpoints: Vec<ApiEndpointDoc> = self
            .endpoints
            .iter()
            .filter(|doc| tag.is_none_or(|tag| doc.tag == tag.trim()))
            .filter(|doc| {
                keyword.is_none_or(|keyword| {
                    matches_keyword(keyword, &[&doc.path, &doc.summary, &doc.tag])
                })
            })
            .cloned()
            .collect();
        endpoints.sort_by(|a, b| {
            a.tag
                .cmp(&b.tag)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| method_rank(&a.method).cmp(&method_rank(&b.method)))
        });
        endpoints
    }

    pub fn get(&self, id: Uuid) -> DomainResult<&ApiEndpointDoc> {
        self.endpoints
            .iter()
            .find(|doc| doc.id == id)
            .ok_or(DomainError::NotFound("未找到该接口文档。"))
    }

    pub fn create(
        &mut self,
        input: ApiEndpointInput,
        now: DateTime<Utc>,
    ) -> DomainResult<ApiEndpointDoc> {
        let doc = build_doc(Uuid::new_v4(), input, now)?;
        self.ensure_unique(&doc.method, &doc.path, None)?;
        self.endpoints.push(doc.clone());
        Ok(doc)
    }

    pub fn update(
        &mut self,
        id: Uuid,
        input: ApiEndpointInput,
        now: DateTime<Utc>,
    ) -> DomainResult<ApiEndpointDoc> {
        self.get(id)?;
        let doc = build_doc(id, input, now)?;
        self.ensure_unique(&doc.method, &doc.path, Some(id))?;

        if let Some(existing) = self.endpoints.iter_mut().find(|existing| existing.id == id) {
            *existing = doc.clone();
        }
        Ok(doc)
    }

    pub fn delete(&mut self, id: Uuid) -> DomainResult<()> {
        let before = self.endpoints.len();
        self.endpoints.retain(|doc| doc.id != id);
        if self.endpoints.len() == before {
            return Err(DomainError::NotFound("未找到该接口文档。"));
        }
        Ok(())
    }

    pub fn tags(&self) -> Vec<TagSummary> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in &self.endpoints {
            *counts.entry(doc.tag.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(tag, count)| TagSummary {
                tag: tag.to_string(),
                count,
            })
            .collect()
    }

    fn ensure_unique(&self, method: &str, path: &str, except: Option<Uuid>) -> DomainResult<()> {
        let clash = self.endpoints.iter().any(|doc| {
            Some(doc.id) != except && doc.method == method && doc.path == path
        });
        if clash {
            return Err(DomainError::Conflict(format!(
                "接口 {method} {path} 已存在文档。"
            )));
        }
        Ok(())
    }
}

fn build_doc(
    id: Uuid,
    input: ApiEndpointInput,
    now: DateTime<Utc>,
) -> DomainResult<ApiEndpointDoc> {
    let method = input.method.trim().to_ascii_uppercase();
    if !ALLOWED_METHODS.contains(&method.as_str()) {
        return Err(DomainError::invalid(format!(
            "不支持的请求方法：{}",
            input.method.trim()
        )));
    }

    let path = input.path.trim().to_string();
    if !path.starts_with('/') || path.contains(char::is_whitespace) {
        return Err(DomainError::invalid("接口路径必须以 / 开头且不能包含空白。"));
    }

    let summary = input.summary.trim().to_string();
    if summary.is_empty() {
        return Err(DomainError::invalid("请填写接口简介。"));
    }

    let tag = input.tag.trim().to_string();
    if tag.is_empty() {
        return Err(DomainError::invalid("请填写接口分组。"));
    }

    let mut params = Vec::with_capacity(input.params.len());
    for param in input.params {
        let name = param.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::invalid("参数名称不能为空。"));
        }
        params.push(ApiParamDoc {
            name,
            description: param.description.trim().to_string(),
            ..param
        });
    }

    Ok(ApiEndpointDoc {
        id,
        method,
        path,
        summary,
        description: clean_optional(input.description.as_deref()),
        tag,
        params,
        sample_response: input.sample_response,
        deprecated: input.deprecated,
        updated_at: now,
    })
}

fn method_rank(method: &str) -> usize {
    ALLOWED_METHODS
        .iter()
        .position(|allowed| *allowed == method)
        .unwrap_or(ALLOWED_METHODS.len())
}

/// Renders the catalog (optionally one tag) as a Markdown reference.
pub fn render_markdown(docs: &[ApiEndpointDoc]) -> String {
    let mut out = String::from("# 接口文档\n");

    let mut current_tag: Option<&str> = None;
    for doc in docs {
        if current_tag != Some(doc.tag.as_str()) {
            out.push_str(&format!("\n## {}\n", doc.tag));
            current_tag = Some(doc.tag.as_str());
        }

        let deprecated = if doc.deprecated { "（已废弃）" } else { "" };
        out.push_str(&format!(
            "\n### `{} {}`{}\n\n{}\n",
            doc.method, doc.path, deprecated, doc.summary
        ));
        if let Some(description) = &doc.description {
            out.push_str(&format!("\n{description}\n"));
        }

        if !doc.params.is_empty() {
            out.push_str("\n| 参数 | 位置 | 必填 | 说明 |\n| --- | --- | --- | --- |\n");
            for param in &doc.params {
                out.push_str(&format!(
                    "| `{}` | {} | {} | {} |\n",
                    param.name,
                    param.location.label_zh(),
                    if param.required { "是" } else { "否" },
                    param.description.replace('|', "\\|"),
                ));
            }
        }

        if let Some(sample) = &doc.sample_response {
            let pretty =
                serde_json::to_string_pretty(sample).unwrap_or_else(|_| sample.to_string());
            out.push_str(&format!("\n响应示例：\n\n```json\n{pretty}\n```\n"));
        }
    }

    if docs.is_empty() {
        out.push_str("\n暂无接口文档。\n");
    }

    out
}
