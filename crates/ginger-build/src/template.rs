//! Handler source templates for new functions

use ginger_types::EventSource;

/// Go source written to `functions/<name>/main.go` on function creation
pub fn render_handler(name: &str, source: EventSource) -> String {
    let handler = camel_case(name);
    let (import, argument, returns, body) = match source {
        EventSource::ApiGateway => (
            "\n\t\"github.com/aws/aws-lambda-go/events\"",
            "request events.APIGatewayProxyRequest",
            "(events.APIGatewayProxyResponse, error)",
            "events.APIGatewayProxyResponse{\n\t\tStatusCode: 200,\n\t\tHeaders:    map[string]string{\"X-Ginger-Response\": \"succeed\"},\n\t\tBody:       \"Hello, ginger lambda!\",\n\t}, nil",
        ),
        EventSource::S3 => (
            "\n\t\"github.com/aws/aws-lambda-go/events\"",
            "s3Event events.S3Event",
            "error",
            "nil",
        ),
        EventSource::CloudWatch => (
            "\n\t\"github.com/aws/aws-lambda-go/events\"",
            "event events.CloudWatchEvent",
            "error",
            "nil",
        ),
        EventSource::Sqs => (
            "\n\t\"github.com/aws/aws-lambda-go/events\"",
            "sqsEvent events.SQSEvent",
            "error",
            "nil",
        ),
        EventSource::Kinesis => (
            "\n\t\"github.com/aws/aws-lambda-go/events\"",
            "kinesisEvent events.KinesisEvent",
            "error",
            "nil",
        ),
        EventSource::Default => ("", "event interface{}", "(interface{}, error)", "event, nil"),
    };

    format!(
        "package main\n\nimport (\n\t\"context\"{import}\n\n\t\"github.com/aws/aws-lambda-go/lambda\"\n)\n\n\
         func {handler}(ctx context.Context, {argument}) {returns} {{\n\treturn {body}\n}}\n\n\
         func main() {{\n\tlambda.Start({handler})\n}}\n"
    )
}

/// `user-profile_sync` becomes `UserProfileSync`
fn camel_case(name: &str) -> String {
    name.split(|c: char| c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("hello"), "Hello");
        assert_eq!(camel_case("user-profile_sync"), "UserProfileSync");
        assert_eq!(camel_case("a--b"), "AB");
    }

    #[test]
    fn test_api_gateway_template() {
        let source = render_handler("get-user", EventSource::ApiGateway);
        assert!(source.starts_with("package main"));
        assert!(source.contains("func GetUser(ctx context.Context, request events.APIGatewayProxyRequest)"));
        assert!(source.contains("lambda.Start(GetUser)"));
    }

    #[test]
    fn test_default_template_has_no_events_import() {
        let source = render_handler("worker", EventSource::Default);
        assert!(!source.contains("aws-lambda-go/events"));
        assert!(source.contains("return event, nil"));
    }
}
