// Copyright (c) 2025 - Cowboy AI, Inc.

//! Stack outputs
//!
//! Some outputs are known at synthesis time (cluster name, the custom-domain
//! URL). Others, such as the load balancer's DNS name, only exist once the
//! resource is deployed. An [`OutputValue`] is therefore a template of
//! literal text and attribute references that can be written into the
//! manifest as-is or rendered against deploy-time attributes.
//!
//! ```rust
//! use portfolio_infrastructure::graph::LogicalId;
//! use portfolio_infrastructure::topology::outputs::{OutputValue, StaticAttributes};
//!
//! let alb = LogicalId::new("PortfolioALB").unwrap();
//! let url = OutputValue::literal("http://").then_attribute(&alb, "DNSName");
//!
//! let attributes = StaticAttributes::new().with_attribute(&alb, "DNSName", "abc.elb.amazonaws.com");
//! assert_eq!(url.resolve(&attributes).unwrap(), "http://abc.elb.amazonaws.com");
//! ```

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use super::TopologyPlan;
use crate::config::StackConfiguration;
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::LogicalId;

pub const LOAD_BALANCER_DNS: &str = "LoadBalancerDNS";
pub const WEBSITE_URL: &str = "WebsiteURL";
pub const CLUSTER_NAME: &str = "ECSClusterName";
pub const SERVICE_NAME: &str = "ECSServiceName";
pub const DISTRIBUTION_DOMAIN: &str = "CloudFrontDistributionDomain";

/// One piece of an output template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSegment {
    Literal(String),
    Attribute { resource: LogicalId, name: String },
}

/// Output value template
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputValue {
    segments: Vec<OutputSegment>,
}

impl OutputValue {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::default().then_literal(text)
    }

    pub fn attribute(resource: &LogicalId, name: impl Into<String>) -> Self {
        Self::default().then_attribute(resource, name)
    }

    /// Append literal text
    pub fn then_literal(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        match self.segments.last_mut() {
            Some(OutputSegment::Literal(previous)) => previous.push_str(&text),
            _ => self.segments.push(OutputSegment::Literal(text)),
        }
        self
    }

    /// Append a deploy-time attribute of `resource`
    pub fn then_attribute(mut self, resource: &LogicalId, name: impl Into<String>) -> Self {
        self.segments.push(OutputSegment::Attribute {
            resource: resource.clone(),
            name: name.into(),
        });
        self
    }

    pub fn segments(&self) -> &[OutputSegment] {
        &self.segments
    }

    /// The value, if it contains no attribute references
    pub fn as_literal(&self) -> Option<String> {
        self.segments
            .iter()
            .map(|segment| match segment {
                OutputSegment::Literal(text) => Some(text.as_str()),
                OutputSegment::Attribute { .. } => None,
            })
            .collect::<Option<Vec<&str>>>()
            .map(|parts| parts.concat())
    }

    /// Resources whose attributes this value reads
    pub fn referenced_resources(&self) -> Vec<&LogicalId> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                OutputSegment::Attribute { resource, .. } => Some(resource),
                OutputSegment::Literal(_) => None,
            })
            .collect()
    }

    /// Render against deploy-time attributes
    ///
    /// # Errors
    /// [`SynthesisError::DependencyResolution`] naming the resource and
    /// `resource.attribute` when an attribute is unknown.
    pub fn resolve(&self, source: &dyn AttributeSource) -> SynthesisResult<String> {
        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                OutputSegment::Literal(text) => rendered.push_str(text),
                OutputSegment::Attribute { resource, name } => {
                    let value = source.attribute(resource, name).ok_or_else(|| {
                        SynthesisError::dependency(resource.as_str(), format!("{resource}.{name}"))
                    })?;
                    rendered.push_str(&value);
                }
            }
        }
        Ok(rendered)
    }

    /// Manifest form: a string, a `Fn::GetAtt`, or a `Fn::Join` of both
    pub fn to_manifest(&self) -> Value {
        let part = |segment: &OutputSegment| match segment {
            OutputSegment::Literal(text) => json!(text),
            OutputSegment::Attribute { resource, name } => {
                json!({ "Fn::GetAtt": [resource.as_str(), name] })
            }
        };
        match self.segments.as_slice() {
            [] => json!(""),
            [only] => part(only),
            many => {
                let parts: Vec<Value> = many.iter().map(part).collect();
                json!({ "Fn::Join": ["", parts] })
            }
        }
    }
}

/// Deploy-time attribute values, e.g. from the orchestrator's stack outputs
pub trait AttributeSource {
    fn attribute(&self, resource: &LogicalId, name: &str) -> Option<String>;
}

/// In-memory attribute values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticAttributes {
    values: BTreeMap<(LogicalId, String), String>,
}

impl StaticAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(
        mut self,
        resource: &LogicalId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.values
            .insert((resource.clone(), name.into()), value.into());
        self
    }
}

impl AttributeSource for StaticAttributes {
    fn attribute(&self, resource: &LogicalId, name: &str) -> Option<String> {
        self.values
            .get(&(resource.clone(), name.to_string()))
            .cloned()
    }
}

/// One named output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOutput {
    pub description: String,
    pub value: OutputValue,
}

/// Named outputs of a synthesized stack
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackOutputs {
    outputs: BTreeMap<String, StackOutput>,
}

impl StackOutputs {
    fn insert(&mut self, name: &str, description: &str, value: OutputValue) {
        self.outputs.insert(
            name.to_string(),
            StackOutput {
                description: description.to_string(),
                value,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&StackOutput> {
        self.outputs.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.outputs.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Render every output against deploy-time attributes
    pub fn resolve(&self, source: &dyn AttributeSource) -> SynthesisResult<BTreeMap<String, String>> {
        self.outputs
            .iter()
            .map(|(name, output)| Ok((name.clone(), output.value.resolve(source)?)))
            .collect()
    }

    /// `{ <name>: { "Description", "Value" } }`
    pub fn to_manifest(&self) -> Value {
        let outputs: Map<String, Value> = self
            .outputs
            .iter()
            .map(|(name, output)| {
                (
                    name.clone(),
                    json!({
                        "Description": output.description,
                        "Value": output.value.to_manifest(),
                    }),
                )
            })
            .collect();
        Value::Object(outputs)
    }
}

/// Project the finished plan onto its externally useful identifiers
pub fn export_outputs(plan: &TopologyPlan, config: &StackConfiguration) -> StackOutputs {
    let mut outputs = StackOutputs::default();
    let load_balancer = &plan.traffic().load_balancer;
    let compute = plan.compute();

    outputs.insert(
        LOAD_BALANCER_DNS,
        "Application Load Balancer DNS Name",
        OutputValue::attribute(load_balancer, "DNSName"),
    );

    let website = match plan {
        TopologyPlan::Full(_) => OutputValue::literal(format!("https://{}", config.domain_name())),
        TopologyPlan::Simple(_) => {
            OutputValue::literal("http://").then_attribute(load_balancer, "DNSName")
        }
    };
    outputs.insert(WEBSITE_URL, "Portfolio Website URL", website);

    outputs.insert(
        CLUSTER_NAME,
        "ECS Cluster Name",
        OutputValue::literal(compute.cluster_name.clone()),
    );
    outputs.insert(
        SERVICE_NAME,
        "ECS Service Name",
        OutputValue::literal(compute.service.name.clone()),
    );

    if let Some(edge) = plan.edge() {
        outputs.insert(
            DISTRIBUTION_DOMAIN,
            "CloudFront Distribution Domain Name",
            OutputValue::attribute(&edge.distribution.id, "DomainName"),
        );
    }

    outputs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alb() -> LogicalId {
        LogicalId::new("PortfolioALB").unwrap()
    }

    #[test]
    fn test_literal_segments_merge() {
        let value = OutputValue::literal("https://").then_literal("example.com");
        assert_eq!(value.segments().len(), 1);
        assert_eq!(value.as_literal().as_deref(), Some("https://example.com"));
        assert_eq!(value.to_manifest(), json!("https://example.com"));
    }

    #[test]
    fn test_attribute_template_manifest() {
        let value = OutputValue::literal("http://").then_attribute(&alb(), "DNSName");
        assert_eq!(value.as_literal(), None);
        assert_eq!(value.referenced_resources(), vec![&alb()]);
        assert_eq!(
            value.to_manifest(),
            json!({ "Fn::Join": ["", ["http://", { "Fn::GetAtt": ["PortfolioALB", "DNSName"] }]] })
        );
        assert_eq!(
            OutputValue::attribute(&alb(), "DNSName").to_manifest(),
            json!({ "Fn::GetAtt": ["PortfolioALB", "DNSName"] })
        );
    }

    #[test]
    fn test_resolve_missing_attribute() {
        let value = OutputValue::attribute(&alb(), "DNSName");
        let err = value.resolve(&StaticAttributes::new()).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::dependency("PortfolioALB", "PortfolioALB.DNSName")
        );
    }
}
