use std::collections::BTreeMap;

use clap::{Parser, ValueEnum};
use lpc_marshal::{
    Endianness, LpcCodec, LpcScheme, MarshalError, WireConfig,
    fri::FriParams,
    lpc::{BatchShape, CommitmentScheme, sample::random_eval_proof},
    marshalling::modulus_bits,
};
use p3_baby_bear::BabyBear;
use p3_field::{BasedVectorSpace, PrimeField64, extension::BinomialExtensionField};
use p3_goldilocks::Goldilocks;
use p3_koala_bear::KoalaBear;
use rand::{
    Rng, SeedableRng,
    distr::{Distribution, StandardUniform},
    rngs::StdRng,
};
use tracing::info;
use tracing_forest::{ForestLayer, util::LevelFilter};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

const DIGEST_ELEMS: usize = 8;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Field {
    BabyBear,
    KoalaBear,
    Goldilocks,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, value_enum, default_value = "baby-bear")]
    field: Field,

    #[arg(short = 'e', long, default_value = "little")]
    endianness: Endianness,

    /// Wire width of a field element; defaults to the modulus width.
    #[arg(long)]
    field_bits: Option<usize>,

    #[arg(short = 'q', long = "queries", default_value = "16")]
    num_queries: usize,

    #[arg(short = 'd', long = "log-domain", default_value = "16")]
    log_domain_size: usize,

    #[arg(short = 'k', long = "fold", value_delimiter = ',', default_value = "4,4")]
    fold_steps: Vec<usize>,

    #[arg(long, default_value = "8")]
    final_poly_len: usize,

    #[arg(short = 'b', long, default_value = "2")]
    batches: usize,

    #[arg(short = 'p', long, default_value = "4")]
    polys: usize,

    #[arg(long, default_value = "2")]
    points: usize,

    #[arg(short = 'n', long, default_value = "8")]
    proofs: usize,

    #[arg(short = 's', long, default_value = "0")]
    seed: u64,
}

fn run<F, EF>(args: &Args) -> Result<(), MarshalError>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F> + Send + Sync + PartialEq + std::fmt::Debug,
    StandardUniform: Distribution<F> + Distribution<EF>,
{
    let config = WireConfig::new(
        args.endianness,
        args.field_bits.unwrap_or_else(modulus_bits::<F>),
    )?;
    let fri_params = FriParams {
        num_queries: args.num_queries,
        log_domain_size: args.log_domain_size,
        fold_steps: args.fold_steps.clone(),
        final_poly_len: args.final_poly_len,
    };
    let scheme = CommitmentScheme::Lpc(LpcScheme {
        fri_params: fri_params.clone(),
    });
    let codec = LpcCodec::<F, EF, DIGEST_ELEMS>::for_scheme(&scheme, config)?;

    let shapes: BTreeMap<usize, BatchShape> = (0..args.batches)
        .map(|id| {
            (
                id,
                BatchShape {
                    num_polys: args.polys,
                    num_points: args.points,
                },
            )
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(args.seed);

    let root: [F; DIGEST_ELEMS] = rng.random();
    let commitment = codec.encode_commitment(&root)?;
    assert_eq!(codec.decode_commitment(commitment.as_bytes())?, root);

    let proofs: Vec<_> = (0..args.proofs)
        .map(|_| random_eval_proof::<F, EF, _, DIGEST_ELEMS>(&mut rng, &shapes, &fri_params))
        .collect();
    let wires = proofs
        .iter()
        .map(|proof| codec.encode_eval_proof(proof))
        .collect::<Result<Vec<_>, _>>()?;

    for (decoded, proof) in codec.decode_eval_proofs(&wires).into_iter().zip(&proofs) {
        assert_eq!(&decoded?, proof);
    }

    println!("=========================================");
    println!("LPC marshalling ({:?}, {})", args.field, config.endianness());
    println!("Commitment size: {} B", commitment.len());
    if let Some(wire) = wires.first() {
        println!("Evaluation proof size: {:.1} KiB", wire.len() as f64 / 1024.0);
    }
    info!(proofs = wires.len(), "all proofs round-tripped");
    Ok(())
}

fn main() -> Result<(), MarshalError> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    Registry::default()
        .with(env_filter)
        .with(ForestLayer::default())
        .init();

    let args = Args::parse();

    match args.field {
        Field::BabyBear => run::<BabyBear, BinomialExtensionField<BabyBear, 4>>(&args),
        Field::KoalaBear => run::<KoalaBear, BinomialExtensionField<KoalaBear, 4>>(&args),
        Field::Goldilocks => run::<Goldilocks, BinomialExtensionField<Goldilocks, 2>>(&args),
    }
}
