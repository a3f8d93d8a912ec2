use micro_service::{Arguments, MethodMetadata, ParameterKind, TypeRef};

/// One declared method together with the arguments it is invoked with.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    method: fn() -> MethodMetadata,
    arguments: fn() -> Arguments,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, method: fn() -> MethodMetadata, arguments: fn() -> Arguments) -> Self {
        Self { name, group, method, arguments }
    }

    pub fn small(name: &'static str, method: fn() -> MethodMetadata, arguments: fn() -> Arguments) -> Self {
        Self::new(name, TestGroup::Small, method, arguments)
    }

    pub fn large(name: &'static str, method: fn() -> MethodMetadata, arguments: fn() -> Arguments) -> Self {
        Self::new(name, TestGroup::Large, method, arguments)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn method(&self) -> MethodMetadata {
        (self.method)()
    }

    pub fn arguments(&self) -> Arguments {
        (self.arguments)()
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Large,
}

pub const BASE_URL: &str = "https://api.example.test/v1/";

pub fn test_cases() -> Vec<TestCase> {
    vec![
        TestCase::small("path_only", get_user, || Arguments::new().arg(42)),
        TestCase::large("query_and_headers", search_repos, || {
            Arguments::new()
                .arg("foldright")
                .arg(vec!["rust".to_string(), "http client".to_string(), "a&b".to_string()])
                .arg(2)
                .arg("token 8f2c")
                .arg(vec![("x-trace".to_string(), "7".to_string()), ("x-tenant".to_string(), "acme".to_string())])
        }),
        TestCase::large("form_fields", create_user, || {
            Arguments::new()
                .arg("zava kid")
                .arg("zava.kid@gmail.com")
                .arg(vec![("lang".to_string(), "rust".to_string()), ("city".to_string(), "hang zhou".to_string())])
        }),
    ]
}

fn get_user() -> MethodMetadata {
    MethodMetadata::builder("getUser")
        .get("users/{id}")
        .param(ParameterKind::path("id"))
        .returns(TypeRef::call(TypeRef::named("User")))
        .build()
}

fn search_repos() -> MethodMetadata {
    MethodMetadata::builder("searchRepos")
        .get("orgs/{org}/repos")
        .header("Accept: application/json")
        .header("User-Agent: micro-bench")
        .param(ParameterKind::path("org"))
        .param(ParameterKind::query("topic"))
        .param(ParameterKind::query("page"))
        .param(ParameterKind::header("Authorization"))
        .param(ParameterKind::header_map())
        .returns(TypeRef::call(TypeRef::generic("Vec", [TypeRef::named("Repo")])))
        .build()
}

fn create_user() -> MethodMetadata {
    MethodMetadata::builder("createUser")
        .post("users")
        .form_url_encoded()
        .param(ParameterKind::field("name"))
        .param(ParameterKind::field("email"))
        .param(ParameterKind::field_map())
        .returns(TypeRef::call(TypeRef::named("User")))
        .build()
}
