#![deny(missing_docs)]

//! # Document Generation
//!
//! Assembles an OpenAPI 3.0 document from discovered API operations.
//!
//! - Paths are keyed by the route template with constraints stripped
//!   (`/users/{id:int}` becomes `/users/{id}`).
//! - Path parameters are always required.
//! - A body parameter becomes the `application/json` request body. Form
//!   parameters are folded into one object schema.
//! - Operations are tagged with their group name.
//! - Component schemas are whatever the schema repository holds at the end of
//!   the pass.

use crate::catalog::{MemberInfo, ParameterInfo, TypeId};
use crate::error::{AppError, AppResult};
use crate::generator::SchemaGenerator;
use crate::repository::SchemaRepository;
use crate::schema::{Schema, SchemaType};
use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

const JSON_CONTENT: &str = "application/json";
const FORM_CONTENT: &str = "application/x-www-form-urlencoded";
const MULTIPART_CONTENT: &str = "multipart/form-data";

/// Source of an action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Route segment.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
    /// Request body.
    Body,
    /// Form field.
    Form,
}

/// A discovered action parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiParameter {
    /// Name as bound from the request.
    pub name: String,
    /// Where the value comes from.
    pub location: ParameterLocation,
    /// Bound type. Untyped parameters are described as strings.
    pub type_id: Option<TypeId>,
    /// Model member the value binds to, for complex-type binding.
    pub member: Option<MemberInfo>,
    /// Action parameter the value binds to.
    pub parameter: Option<ParameterInfo>,
    /// Explicitly required.
    pub is_required: bool,
    /// Free text description.
    pub description: Option<String>,
}

impl ApiParameter {
    /// Creates an untyped parameter.
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            type_id: None,
            member: None,
            parameter: None,
            is_required: false,
            description: None,
        }
    }

    /// Sets the bound type.
    pub fn with_type(mut self, ty: TypeId) -> Self {
        self.type_id = Some(ty);
        self
    }

    /// Sets the model member the value binds to.
    pub fn with_member(mut self, member: MemberInfo) -> Self {
        self.type_id.get_or_insert(member.member_type);
        self.member = Some(member);
        self
    }

    /// Sets the action parameter the value binds to.
    pub fn with_parameter(mut self, parameter: ParameterInfo) -> Self {
        self.type_id.get_or_insert(parameter.parameter_type);
        self.parameter = Some(parameter);
        self
    }

    /// Marks the parameter required.
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn required_by_metadata(&self) -> bool {
        self.is_required
            || self.location == ParameterLocation::Path
            || self.member.as_ref().is_some_and(|m| m.is_required)
            || self.parameter.as_ref().is_some_and(|p| p.is_required)
    }
}

/// A discovered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// Status code (`200`, `404`, `default`).
    pub status_code: String,
    /// Payload type, if any.
    pub type_id: Option<TypeId>,
    /// Description override.
    pub description: Option<String>,
}

impl ApiResponse {
    /// Creates a response without payload.
    pub fn new(status_code: impl Into<String>) -> Self {
        Self {
            status_code: status_code.into(),
            type_id: None,
            description: None,
        }
    }

    /// Sets the payload type.
    pub fn with_type(mut self, ty: TypeId) -> Self {
        self.type_id = Some(ty);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A discovered API operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiOperation {
    /// HTTP method, any case.
    pub http_method: String,
    /// Route template, constraints allowed (`users/{id:int}`).
    pub relative_path: String,
    /// Controller or group name, used as the tag.
    pub group_name: Option<String>,
    /// Explicit operation id.
    pub operation_id: Option<String>,
    /// Short summary.
    pub summary: Option<String>,
    /// Parameters in binding order.
    pub parameters: Vec<ApiParameter>,
    /// Responses in declaration order.
    pub responses: Vec<ApiResponse>,
    /// Marked obsolete.
    pub deprecated: bool,
}

impl ApiOperation {
    /// Creates an operation without parameters or responses.
    pub fn new(http_method: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            http_method: http_method.into(),
            relative_path: relative_path.into(),
            group_name: None,
            operation_id: None,
            summary: None,
            parameters: Vec::new(),
            responses: Vec::new(),
            deprecated: false,
        }
    }

    /// Sets the group name.
    pub fn with_group_name(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = Some(group_name.into());
        self
    }

    /// Sets the operation id.
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Appends a parameter.
    pub fn with_parameter(mut self, parameter: ApiParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Appends a response.
    pub fn with_response(mut self, response: ApiResponse) -> Self {
        self.responses.push(response);
        self
    }

    /// Marks the operation obsolete.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    /// API title.
    pub title: String,
    /// API version.
    pub version: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Info {
    /// Creates metadata with the required fields.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Default for Info {
    fn default() -> Self {
        Self::new("API", "v1")
    }
}

/// Tag declared at the document root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name.
    pub name: String,
}

/// Parameter Object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Location (`path`, `query`, `header`, `cookie`).
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Free text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Value schema.
    pub schema: Schema,
}

/// Media Type Object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Payload schema.
    pub schema: Schema,
}

/// Request Body Object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Payload by content type.
    pub content: IndexMap<String, MediaType>,
    /// Must be supplied.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
}

/// Response Object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Description.
    pub description: String,
    /// Payload by content type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// Operation Object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Tags (the group name).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Operation id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Non-body parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses by status code.
    pub responses: IndexMap<String, Response>,
    /// Marked obsolete.
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
}

/// Path Item Object: operations by lowercase HTTP method.
pub type PathItem = IndexMap<String, Operation>;

/// Components Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    /// Named schema definitions.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Schema>,
}

/// The generated OpenAPI document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version.
    pub openapi: String,
    /// Metadata.
    pub info: Info,
    /// Operations by normalized route.
    pub paths: IndexMap<String, PathItem>,
    /// Component definitions.
    #[serde(default)]
    pub components: Components,
    /// Tags in first-use order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl OpenApiDocument {
    /// Empty document.
    pub fn new(info: Info) -> Self {
        Self {
            openapi: "3.0.1".to_string(),
            info,
            paths: IndexMap::new(),
            components: Components::default(),
            tags: Vec::new(),
        }
    }

    /// Pretty JSON rendering.
    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AppError::General(format!("Failed to serialize document: {}", e)))
    }

    /// YAML rendering.
    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AppError::General(format!("Failed to serialize document: {}", e)))
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// What a document filter can see.
pub struct DocumentFilterContext<'a> {
    /// The operations the document was built from.
    pub operations: &'a [ApiOperation],
    /// The repository of the pass. Definitions added here are emitted.
    pub repository: &'a mut SchemaRepository,
    /// The schema generator.
    pub generator: &'a SchemaGenerator,
}

/// Mutates the assembled document.
pub trait DocumentFilter: Send + Sync {
    /// Applies the filter.
    fn apply(
        &self,
        document: &mut OpenApiDocument,
        context: &mut DocumentFilterContext<'_>,
    ) -> AppResult<()>;
}

/// Document filter that needs to await (for example to look up security
/// schemes). Only run by [`DocumentGenerator::generate_document_async`].
#[async_trait]
pub trait AsyncDocumentFilter: Send + Sync {
    /// Applies the filter.
    async fn apply(
        &self,
        document: &mut OpenApiDocument,
        context: &mut DocumentFilterContext<'_>,
    ) -> AppResult<()>;
}

/// Configuration of the document generator.
#[derive(Clone, Default)]
pub struct DocumentGeneratorOptions {
    /// Document metadata.
    pub info: Info,
    /// Synchronous document filters in registration order.
    pub document_filters: Vec<Arc<dyn DocumentFilter>>,
    /// Asynchronous document filters in registration order.
    pub async_document_filters: Vec<Arc<dyn AsyncDocumentFilter>>,
}

impl fmt::Debug for DocumentGeneratorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentGeneratorOptions")
            .field("info", &self.info)
            .field("document_filters", &self.document_filters.len())
            .field("async_document_filters", &self.async_document_filters.len())
            .finish()
    }
}

impl DocumentGeneratorOptions {
    /// Options with the given metadata.
    pub fn new(info: Info) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    /// Appends a document filter.
    pub fn with_document_filter<F>(mut self, filter: F) -> Self
    where
        F: DocumentFilter + 'static,
    {
        self.document_filters.push(Arc::new(filter));
        self
    }

    /// Appends an async document filter.
    pub fn with_async_document_filter<F>(mut self, filter: F) -> Self
    where
        F: AsyncDocumentFilter + 'static,
    {
        self.async_document_filters.push(Arc::new(filter));
        self
    }
}

/// Strips route constraints, defaults and catch-all markers from parameter
/// segments and makes the path absolute.
pub fn normalize_route(relative_path: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\{\*{0,2}([^}:=?]+)[^}]*\}").expect("Invalid route parameter regex")
    });
    let stripped = re.replace_all(relative_path.trim(), "{$1}");
    let trimmed = stripped.trim_start_matches('/');
    format!("/{}", trimmed)
}

/// Default description for a status code.
fn response_description(status_code: &str) -> &'static str {
    match status_code {
        "400" => "Bad Request",
        "401" => "Unauthorized",
        "403" => "Forbidden",
        "404" => "Not Found",
        "405" => "Method Not Allowed",
        "406" => "Not Acceptable",
        "408" => "Request Timeout",
        "409" => "Conflict",
        "429" => "Too Many Requests",
        code if code.starts_with('1') => "Information",
        code if code.starts_with('2') => "Success",
        code if code.starts_with('3') => "Redirect",
        code if code.starts_with('4') => "Client Error",
        code if code.starts_with('5') => "Server Error",
        _ => "Error",
    }
}

/// Builds OpenAPI documents.
#[derive(Debug, Clone)]
pub struct DocumentGenerator {
    generator: SchemaGenerator,
    options: DocumentGeneratorOptions,
}

impl DocumentGenerator {
    /// Creates a document generator.
    pub fn new(generator: SchemaGenerator, options: DocumentGeneratorOptions) -> Self {
        Self { generator, options }
    }

    /// The schema generator in use.
    pub fn schema_generator(&self) -> &SchemaGenerator {
        &self.generator
    }

    /// Builds the document and runs the synchronous document filters.
    pub fn generate_document(&self, operations: &[ApiOperation]) -> AppResult<OpenApiDocument> {
        let mut repository = SchemaRepository::new();
        let mut document = self.build(operations, &mut repository)?;
        self.run_document_filters(&mut document, operations, &mut repository)?;
        merge_components(&mut document, &repository);
        Ok(document)
    }

    /// Same as [`generate_document`](Self::generate_document), then awaits
    /// every async document filter in order.
    pub async fn generate_document_async(
        &self,
        operations: &[ApiOperation],
    ) -> AppResult<OpenApiDocument> {
        let mut repository = SchemaRepository::new();
        let mut document = self.build(operations, &mut repository)?;
        self.run_document_filters(&mut document, operations, &mut repository)?;

        for filter in &self.options.async_document_filters {
            let mut context = DocumentFilterContext {
                operations,
                repository: &mut repository,
                generator: &self.generator,
            };
            filter.apply(&mut document, &mut context).await?;
        }

        merge_components(&mut document, &repository);
        Ok(document)
    }

    fn run_document_filters(
        &self,
        document: &mut OpenApiDocument,
        operations: &[ApiOperation],
        repository: &mut SchemaRepository,
    ) -> AppResult<()> {
        merge_components(document, repository);
        for filter in &self.options.document_filters {
            let mut context = DocumentFilterContext {
                operations,
                repository: &mut *repository,
                generator: &self.generator,
            };
            filter.apply(document, &mut context)?;
        }
        Ok(())
    }

    fn build(
        &self,
        operations: &[ApiOperation],
        repository: &mut SchemaRepository,
    ) -> AppResult<OpenApiDocument> {
        let mut document = OpenApiDocument::new(self.options.info.clone());
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for api in operations {
            let path = normalize_route(&api.relative_path);
            let method = api.http_method.to_lowercase();
            if !seen.insert((method.clone(), path.clone())) {
                return Err(AppError::DuplicateOperation(format!(
                    "{} {}",
                    api.http_method.to_uppercase(),
                    path
                )));
            }

            let operation = self.build_operation(api, repository)?;
            if let Some(group) = &api.group_name {
                if !document.tags.iter().any(|tag| &tag.name == group) {
                    document.tags.push(Tag {
                        name: group.clone(),
                    });
                }
            }
            debug!(method = %method, path = %path, "generated operation");
            document.paths.entry(path).or_default().insert(method, operation);
        }

        Ok(document)
    }

    fn build_operation(
        &self,
        api: &ApiOperation,
        repository: &mut SchemaRepository,
    ) -> AppResult<Operation> {
        let mut parameters = Vec::new();
        let mut body = None;
        let mut form = Vec::new();

        for parameter in &api.parameters {
            match parameter.location {
                ParameterLocation::Body => match body {
                    None => body = Some(parameter),
                    Some(first) => warn!(
                        method = %api.http_method,
                        path = %api.relative_path,
                        kept = %first.name,
                        ignored = %parameter.name,
                        "operation has more than one body parameter"
                    ),
                },
                ParameterLocation::Form => form.push(parameter),
                location => parameters.push(Parameter {
                    name: parameter.name.clone(),
                    location,
                    description: parameter.description.clone(),
                    required: parameter.required_by_metadata(),
                    schema: self.parameter_schema(parameter, repository)?,
                }),
            }
        }

        let request_body = match body {
            Some(parameter) => Some(RequestBody {
                content: media(JSON_CONTENT, self.parameter_schema(parameter, repository)?),
                required: parameter.required_by_metadata(),
            }),
            None if !form.is_empty() => Some(self.form_body(&form, repository)?),
            None => None,
        };

        let mut responses = IndexMap::new();
        for response in &api.responses {
            let content = match response.type_id {
                Some(ty) => media(JSON_CONTENT, self.generator.generate_schema(ty, repository)?),
                None => IndexMap::new(),
            };
            let description = response
                .description
                .clone()
                .unwrap_or_else(|| response_description(&response.status_code).to_string());
            responses.insert(
                response.status_code.clone(),
                Response {
                    description,
                    content,
                },
            );
        }
        if responses.is_empty() {
            responses.insert(
                "200".to_string(),
                Response {
                    description: response_description("200").to_string(),
                    content: IndexMap::new(),
                },
            );
        }

        Ok(Operation {
            tags: api.group_name.iter().cloned().collect(),
            summary: api.summary.clone(),
            operation_id: api.operation_id.clone(),
            parameters,
            request_body,
            responses,
            deprecated: api.deprecated,
        })
    }

    fn form_body(
        &self,
        form: &[&ApiParameter],
        repository: &mut SchemaRepository,
    ) -> AppResult<RequestBody> {
        let mut schema = Schema::object();
        let mut has_binary = false;
        for parameter in form {
            let property = self.parameter_schema(parameter, repository)?;
            has_binary |= is_binary_schema(&property);
            if parameter.required_by_metadata() {
                schema.required.insert(parameter.name.clone());
            }
            schema.properties.insert(parameter.name.clone(), property);
        }
        let content_type = if has_binary {
            MULTIPART_CONTENT
        } else {
            FORM_CONTENT
        };
        Ok(RequestBody {
            content: media(content_type, schema),
            required: false,
        })
    }

    fn parameter_schema(
        &self,
        parameter: &ApiParameter,
        repository: &mut SchemaRepository,
    ) -> AppResult<Schema> {
        let Some(ty) = parameter.type_id else {
            return Ok(Schema::primitive(SchemaType::String, None));
        };
        if let Some(member) = &parameter.member {
            return self
                .generator
                .generate_schema_for_member(ty, repository, member);
        }
        if let Some(info) = &parameter.parameter {
            return self
                .generator
                .generate_schema_for_parameter(ty, repository, info);
        }
        self.generator.generate_schema(ty, repository)
    }
}

fn media(content_type: &str, schema: Schema) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    content.insert(content_type.to_string(), MediaType { schema });
    content
}

fn is_binary_schema(schema: &Schema) -> bool {
    if schema.format.as_deref() == Some("binary") {
        return true;
    }
    schema.items.as_deref().is_some_and(is_binary_schema)
}

fn merge_components(document: &mut OpenApiDocument, repository: &SchemaRepository) {
    for (id, schema) in repository.schemas() {
        document.components.schemas.entry(id).or_insert(schema);
    }
}
