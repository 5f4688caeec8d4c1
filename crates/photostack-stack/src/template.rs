//! CloudFormation template synthesis.
//!
//! References become intrinsic functions: `Name` and `Id` render as `Ref`,
//! the rest as `Fn::GetAtt` or, for URLs, an `Fn::Join` around one.

use serde_json::{Map, Value, json};

use crate::policy::{PolicyScope, PolicyStatement};
use crate::reference::{Attribute, LogicalId, Reference};
use crate::resource::{
    BucketEncryption, EnvValue, PublicAccess, RemovalPolicy, ResourceConfig, ResourceKind,
    ResourceNode,
};
use crate::stack::Stack;

const TEMPLATE_VERSION: &str = "2010-09-09";
const POLICY_VERSION: &str = "2012-10-17";
/// Managed `CachingOptimized` cache policy.
const CACHING_OPTIMIZED: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

fn get_att(id: &LogicalId, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id.as_str(), attribute] })
}

fn reference_to(id: &LogicalId) -> Value {
    json!({ "Ref": id.as_str() })
}

impl Stack {
    /// Render the stack as a CloudFormation template.
    #[must_use]
    pub fn synthesize(&self) -> Value {
        let mut resources = Map::new();
        for id in self.order() {
            if let Some(node) = self.node(id) {
                self.render_node(node, &mut resources);
            }
        }

        let mut outputs = Map::new();
        for export in self.exports() {
            let key = LogicalId::pascal(&export.name)
                .map_or_else(|_| export.name.clone(), |id| id.to_string());
            outputs.insert(
                key,
                json!({
                    "Value": self.render_ref(&export.value),
                    "Export": { "Name": export.name },
                }),
            );
        }

        json!({
            "AWSTemplateFormatVersion": TEMPLATE_VERSION,
            "Description": format!("PhotoStack resources for stack {}", self.name()),
            "Resources": resources,
            "Outputs": outputs,
        })
    }

    fn kind_of(&self, id: &LogicalId) -> Option<ResourceKind> {
        self.node(id).map(ResourceNode::kind)
    }

    fn render_ref(&self, reference: &Reference) -> Value {
        let id = &reference.node;
        match (reference.attribute, self.kind_of(id)) {
            (Attribute::Name | Attribute::Id, _) => reference_to(id),
            (Attribute::Arn, _) => get_att(id, "Arn"),
            (Attribute::DomainName, Some(ResourceKind::Bucket)) => {
                get_att(id, "RegionalDomainName")
            }
            (Attribute::DomainName, _) => get_att(id, "DomainName"),
            (Attribute::Url, Some(ResourceKind::HttpApi)) => json!({
                "Fn::Join": ["", [
                    "https://",
                    reference_to(id),
                    ".execute-api.",
                    { "Ref": "AWS::Region" },
                    ".",
                    { "Ref": "AWS::URLSuffix" },
                    "/",
                ]]
            }),
            (Attribute::Url, _) => json!({
                "Fn::Join": ["", ["https://", get_att(id, "DomainName"), "/"]]
            }),
        }
    }

    fn render_principal(&self, principal: &Reference) -> Value {
        match self.kind_of(&principal.node) {
            Some(ResourceKind::OriginAccessIdentity) => json!({
                "CanonicalUser": get_att(&principal.node, "S3CanonicalUserId")
            }),
            _ => json!({ "AWS": self.render_ref(principal) }),
        }
    }

    fn render_policy(&self, statements: &[PolicyStatement]) -> Value {
        let statements: Vec<Value> = statements
            .iter()
            .map(|s| {
                let arn = get_att(&s.resource.bucket.node, "Arn");
                let resource = match s.resource.scope {
                    PolicyScope::Bucket => arn,
                    PolicyScope::Objects => json!({ "Fn::Join": ["", [arn, "/*"]] }),
                };
                let actions: Vec<&str> = s.actions.iter().map(|a| a.as_str()).collect();
                let mut statement = json!({
                    "Effect": "Allow",
                    "Action": actions,
                    "Resource": resource,
                });
                if let (Some(principal), Some(obj)) = (&s.principal, statement.as_object_mut()) {
                    obj.insert("Principal".to_owned(), self.render_principal(principal));
                }
                statement
            })
            .collect();
        json!({ "Version": POLICY_VERSION, "Statement": statements })
    }

    fn render_node(&self, node: &ResourceNode, resources: &mut Map<String, Value>) {
        let id = &node.id;
        let depends_on: Vec<String> = node
            .dependencies()
            .iter()
            .map(ToString::to_string)
            .collect();

        let mut resource = json!({ "Type": node.kind().cfn_type() });
        let properties = match &node.config {
            ResourceConfig::Bucket(options) => {
                let mut props = Map::new();
                if options.encryption == BucketEncryption::S3Managed {
                    props.insert(
                        "BucketEncryption".to_owned(),
                        json!({
                            "ServerSideEncryptionConfiguration": [{
                                "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" }
                            }]
                        }),
                    );
                }
                if options.versioned {
                    props.insert(
                        "VersioningConfiguration".to_owned(),
                        json!({ "Status": "Enabled" }),
                    );
                }
                if options.public_access == PublicAccess::BlockAll {
                    props.insert(
                        "PublicAccessBlockConfiguration".to_owned(),
                        json!({
                            "BlockPublicAcls": true,
                            "BlockPublicPolicy": true,
                            "IgnorePublicAcls": true,
                            "RestrictPublicBuckets": true,
                        }),
                    );
                }
                if let Some(index) = &options.index_document {
                    props.insert(
                        "WebsiteConfiguration".to_owned(),
                        json!({ "IndexDocument": index }),
                    );
                }
                let policy = match options.removal_policy {
                    RemovalPolicy::Retain => "Retain",
                    RemovalPolicy::Destroy => "Delete",
                };
                if let Some(obj) = resource.as_object_mut() {
                    obj.insert("DeletionPolicy".to_owned(), json!(policy));
                    obj.insert("UpdateReplacePolicy".to_owned(), json!(policy));
                }
                Value::Object(props)
            }
            ResourceConfig::BucketDeployment { source, bucket } => json!({
                "SourcePath": source.display().to_string(),
                "DestinationBucketName": self.render_ref(bucket),
                "Prune": true,
            }),
            ResourceConfig::OriginAccessIdentity { comment } => json!({
                "CloudFrontOriginAccessIdentityConfig": { "Comment": comment }
            }),
            ResourceConfig::BucketPolicy { bucket, statements } => json!({
                "Bucket": self.render_ref(bucket),
                "PolicyDocument": self.render_policy(statements),
            }),
            ResourceConfig::Role { assumed_by } => json!({
                "AssumeRolePolicyDocument": {
                    "Version": POLICY_VERSION,
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": "sts:AssumeRole",
                        "Principal": { "Service": assumed_by },
                    }],
                },
                "ManagedPolicyArns": [{
                    "Fn::Join": ["", [
                        "arn:",
                        { "Ref": "AWS::Partition" },
                        ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole",
                    ]]
                }],
            }),
            ResourceConfig::RolePolicy { role, statements } => json!({
                "PolicyName": id.as_str(),
                "Roles": [self.render_ref(role)],
                "PolicyDocument": self.render_policy(statements),
            }),
            ResourceConfig::Function(function) => {
                let variables: Map<String, Value> = function
                    .env
                    .iter()
                    .map(|(k, v)| {
                        let value = match v {
                            EnvValue::Literal(s) => json!(s),
                            EnvValue::Ref(r) => self.render_ref(r),
                        };
                        (k.clone(), value)
                    })
                    .collect();
                json!({
                    "Code": { "S3Key": format!("{}.zip", function.entry_point) },
                    "Handler": function.handler,
                    "Runtime": function.runtime,
                    "Role": self.render_ref(&function.role),
                    "Environment": { "Variables": variables },
                })
            }
            ResourceConfig::HttpApi { name, cors } => {
                let methods: Vec<&str> = cors.allow_methods.iter().map(|m| m.as_str()).collect();
                resources.insert(
                    format!("{id}DefaultStage"),
                    json!({
                        "Type": "AWS::ApiGatewayV2::Stage",
                        "Properties": {
                            "ApiId": reference_to(id),
                            "StageName": "$default",
                            "AutoDeploy": true,
                        },
                    }),
                );
                json!({
                    "Name": name,
                    "ProtocolType": "HTTP",
                    "CorsConfiguration": {
                        "AllowOrigins": cors.allow_origins,
                        "AllowMethods": methods,
                    },
                })
            }
            ResourceConfig::Route {
                api,
                method,
                path,
                function,
            } => {
                let integration = format!("{id}Integration");
                resources.insert(
                    integration.clone(),
                    json!({
                        "Type": "AWS::ApiGatewayV2::Integration",
                        "Properties": {
                            "ApiId": self.render_ref(api),
                            "IntegrationType": "AWS_PROXY",
                            "IntegrationUri": self.render_ref(function),
                            "PayloadFormatVersion": "2.0",
                        },
                    }),
                );
                resources.insert(
                    format!("{id}Permission"),
                    json!({
                        "Type": "AWS::Lambda::Permission",
                        "Properties": {
                            "Action": "lambda:InvokeFunction",
                            "FunctionName": self.render_ref(function),
                            "Principal": "apigateway.amazonaws.com",
                        },
                    }),
                );
                json!({
                    "ApiId": self.render_ref(api),
                    "RouteKey": format!("{method} {path}"),
                    "Target": { "Fn::Join": ["", ["integrations/", { "Ref": integration }]] },
                })
            }
            ResourceConfig::Distribution {
                bucket,
                identity,
                default_root_object,
                ..
            } => {
                let origin_id = format!("{}Origin", bucket.node);
                json!({
                    "DistributionConfig": {
                        "Enabled": true,
                        "DefaultRootObject": default_root_object,
                        "Origins": [{
                            "Id": origin_id,
                            "DomainName": get_att(&bucket.node, "RegionalDomainName"),
                            "S3OriginConfig": {
                                "OriginAccessIdentity": {
                                    "Fn::Join": ["", [
                                        "origin-access-identity/cloudfront/",
                                        self.render_ref(identity),
                                    ]]
                                }
                            },
                        }],
                        "DefaultCacheBehavior": {
                            "TargetOriginId": origin_id,
                            "ViewerProtocolPolicy": "redirect-to-https",
                            "CachePolicyId": CACHING_OPTIMIZED,
                        },
                    }
                })
            }
        };

        if let Some(obj) = resource.as_object_mut() {
            obj.insert("Properties".to_owned(), properties);
            if !depends_on.is_empty() {
                obj.insert("DependsOn".to_owned(), json!(depends_on));
            }
        }
        resources.insert(id.to_string(), resource);
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use photostack_core::StackConfig;

    use super::*;
    use crate::builder::StackBuilder;
    use crate::policy::{PolicyResource, S3Action};
    use crate::resource::BucketOptions;

    fn template() -> Value {
        let config = StackConfig::default();
        let mut builder = StackBuilder::new(&config);
        let photos = builder
            .declare_bucket(
                "PhotoBucket",
                BucketOptions::builder()
                    .encryption(BucketEncryption::S3Managed)
                    .build(),
            )
            .unwrap();
        let site = builder
            .declare_bucket(
                "WebsiteBucket",
                BucketOptions::builder()
                    .public_access(PublicAccess::BlockAll)
                    .versioned(true)
                    .index_document("index.html")
                    .build(),
            )
            .unwrap();
        let distribution = builder.declare_distribution(&site).unwrap();
        let function = builder
            .declare_function("GetPhotos", "api/get-photos", "getPhotos", [(
                "PHOTO_BUCKET_NAME",
                photos.attr(Attribute::Name),
            )])
            .unwrap();
        builder
            .declare_policy(&function, PolicyResource::objects(&photos), [S3Action::GetObject])
            .unwrap();
        builder
            .declare_route("/getAllPhotos", Method::GET, &function)
            .unwrap();
        builder
            .declare_export("PhotoStackWebsiteURL", distribution.attr(Attribute::Url))
            .unwrap();
        builder
            .declare_export("PhotoStackBucketName", photos.attr(Attribute::Name))
            .unwrap();
        builder.build().unwrap().synthesize()
    }

    #[test]
    fn test_should_render_resource_types() {
        let t = template();
        let resources = &t["Resources"];
        assert_eq!(resources["PhotoBucket"]["Type"], "AWS::S3::Bucket");
        assert_eq!(resources["GetPhotos"]["Type"], "AWS::Lambda::Function");
        assert_eq!(
            resources["PhotoApiDefaultStage"]["Properties"]["StageName"],
            "$default"
        );
        assert_eq!(
            resources["PhotoApiGetGetAllPhotosRoute"]["Properties"]["RouteKey"],
            "GET /getAllPhotos"
        );
        assert_eq!(
            resources["PhotoApiGetGetAllPhotosRouteIntegration"]["Type"],
            "AWS::ApiGatewayV2::Integration"
        );
        assert_eq!(resources["PhotoBucket"]["DeletionPolicy"], "Retain");
    }

    #[test]
    fn test_should_render_env_reference_as_ref() {
        let t = template();
        assert_eq!(
            t["Resources"]["GetPhotos"]["Properties"]["Environment"]["Variables"]
                ["PHOTO_BUCKET_NAME"],
            json!({ "Ref": "PhotoBucket" })
        );
        let depends_on = t["Resources"]["GetPhotos"]["DependsOn"].as_array().unwrap();
        assert!(depends_on.contains(&json!("PhotoBucket")));
        assert!(depends_on.contains(&json!("GetPhotosServiceRoleDefaultPolicy")));
    }

    #[test]
    fn test_should_grant_identity_as_canonical_user() {
        let t = template();
        let statement =
            &t["Resources"]["WebsiteBucketPolicy"]["Properties"]["PolicyDocument"]["Statement"][0];
        assert_eq!(statement["Action"], json!(["s3:GetObject"]));
        assert_eq!(
            statement["Principal"]["CanonicalUser"],
            json!({ "Fn::GetAtt": ["WebsiteBucketOriginAccessIdentity", "S3CanonicalUserId"] })
        );
    }

    #[test]
    fn test_should_export_outputs_by_name() {
        let t = template();
        assert_eq!(
            t["Outputs"]["PhotoStackBucketName"]["Export"]["Name"],
            "PhotoStackBucketName"
        );
        assert_eq!(
            t["Outputs"]["PhotoStackWebsiteURL"]["Value"]["Fn::Join"][1][1],
            json!({ "Fn::GetAtt": ["WebsiteBucketDistribution", "DomainName"] })
        );
    }
}
