use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use querylab::sql::parse_statement;
use querylab::{EngineConfig, MutationMode, StatementInterpreter};

fn bench_parse(c: &mut Criterion) {
    let sql = "SELECT id, name, email FROM users WHERE (age > 20 AND age <= 40) OR name = 'Fatma Kaya' ORDER BY age DESC LIMIT 10";
    c.bench_function("parse_select", |b| b.iter(|| parse_statement(black_box(sql))));
}

fn bench_select(c: &mut Criterion) {
    let interp = StatementInterpreter::from_config(EngineConfig::default()).unwrap();
    for i in 0..1_000 {
        interp.execute(&format!(
            "INSERT INTO users (name, email, age) VALUES ('user{0}', 'user{0}@example.com', {1})",
            i,
            18 + i % 50
        ));
    }

    c.bench_function("select_filtered_1k", |b| {
        b.iter(|| interp.execute(black_box("SELECT name FROM users WHERE age > 40")))
    });
    c.bench_function("select_ordered_1k", |b| {
        b.iter(|| interp.execute(black_box("SELECT * FROM users ORDER BY age DESC LIMIT 20")))
    });
}

fn bench_insert(c: &mut Criterion) {
    let config = EngineConfig::empty().with_mutation_mode(MutationMode::Apply);
    c.bench_function("insert_100_rows", |b| {
        b.iter_batched(
            || {
                let interp = StatementInterpreter::from_config(config.clone()).unwrap();
                interp.execute("CREATE TABLE t (id SERIAL PRIMARY KEY, label TEXT UNIQUE, n INTEGER)");
                interp
            },
            |interp| {
                for i in 0..100 {
                    interp.execute(&format!("INSERT INTO t (label, n) VALUES ('l{}', {})", i, i));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_parse, bench_select, bench_insert);
criterion_main!(benches);
