//! Reshape performance benchmarks.
//!
//! Measures the wide-to-long reshape across table sizes shaped like the
//! World Bank inflation sheets (about 200 entities by 50 years).

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use owid_etl::{DataTable, EntityStandardizer, VariableSelector, WideToLongReshaper};

/// Generate a wide table with the given number of entities, variables and years.
fn generate_wide_table(entities: usize, variables: usize, years: usize) -> DataTable {
    let mut headers = vec!["country_code".to_string(), "series_name".to_string()];
    headers.extend((0..years).map(|y| (1970 + y).to_string()));

    let mut rows = Vec::with_capacity(entities * variables);
    for v in 0..variables {
        for e in 0..entities {
            let mut row = vec![format!("E{:04}", e), format!("Variable {}", v)];
            // Roughly one cell in five is missing.
            row.extend((0..years).map(|y| {
                if (e + y + v) % 5 == 0 {
                    String::new()
                } else {
                    format!("{:.2}", (e * y) as f64 * 0.01)
                }
            }));
            rows.push(row);
        }
    }
    DataTable::new(headers, rows)
}

fn standardizer(entities: usize) -> EntityStandardizer {
    EntityStandardizer::from_pairs((0..entities).map(|e| (format!("E{:04}", e), format!("Entity {}", e))))
        .unwrap()
}

fn bench_reshape(c: &mut Criterion) {
    let mut group = c.benchmark_group("reshape");

    for &(entities, variables) in &[(50, 1), (200, 1), (200, 5)] {
        let years = 50;
        let table = generate_wide_table(entities, variables, years);
        let standardizer = standardizer(entities);
        let cells = (entities * variables * years) as u64;

        group.throughput(Throughput::Elements(cells));
        group.bench_with_input(
            BenchmarkId::new("wide_to_long", format!("{}x{}x{}", entities, variables, years)),
            &table,
            |b, table| {
                let reshaper = WideToLongReshaper::new(&standardizer);
                b.iter(|| reshaper.reshape(black_box(table)).unwrap())
            },
        );
    }

    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let table = generate_wide_table(200, 10, 50);
    let selector = VariableSelector::new("series_name", ["Variable 3", "Variable 7"]);

    c.bench_function("select_2_of_10_variables", |b| {
        b.iter(|| selector.select(black_box(&table)).unwrap())
    });
}

criterion_group!(benches, bench_reshape, bench_select);
criterion_main!(benches);
