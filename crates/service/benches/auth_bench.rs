use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::auth::service::{AuthService, AuthConfig};
use service::auth::repository::mock::MockAuthRepository;
use service::auth::domain::{RegisterInput, LoginInput};

fn bench_login(c: &mut Criterion) {
    let repo = Arc::new(MockAuthRepository::default());
    let svc = AuthService::new(
        repo.clone(),
        AuthConfig { jwt_secret: "bench-secret-0123456789".into(), token_ttl_hours: 1, password_algorithm: "argon2".into() },
    );

    // 预先注册用户，不计入基准时间
    let rt = tokio::runtime::Runtime::new().unwrap();
    let _ = rt.block_on(svc.register(
        RegisterInput { email: "bench@example.com".into(), name: "Bench".into(), password: "Benchmark1".into(), business_name: Some("Bench HVAC".into()) },
        None,
    ));

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            let session = rt.block_on(svc.login(LoginInput { email: "bench@example.com".into(), password: "Benchmark1".into() })).unwrap();
            svc.verify_token(&session.token).unwrap();
        });
    });
}

criterion_group!(benches, bench_login);
criterion_main!(benches);
