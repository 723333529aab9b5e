use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use crypto_dto::{
    deserialize, deserialize_with_key, serialize, ChannelConfig, CryptoDtoChannel, CryptoDtoMode,
    Dto, SerializationFormat,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct AudioTx {
    callsign: String,
    sequence_counter: u32,
    audio: Vec<u8>,
}

impl Dto for AudioTx {
    const NAME: &'static str = "AudioTxOnTransceiversDto";
    const SHORT_NAME: &'static str = "AT";
    const FORMAT: SerializationFormat = SerializationFormat::Bincode;
}

const KEY: [u8; 32] = [0x24; 32];

fn frame(size: usize) -> AudioTx {
    AudioTx {
        callsign: "DLH4AB".to_string(),
        sequence_counter: 1,
        audio: vec![0xA5; size],
    }
}

#[allow(clippy::unwrap_used)]
fn bench_seal_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("seal_open");
    let payload_sizes = [64usize, 512, 4096, 60_000];

    for &size in &payload_sizes {
        let dto = frame(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(format!("serialize_{size}b"), |b| {
            let mut sequence = 0u32;
            b.iter(|| {
                sequence = sequence.wrapping_add(1);
                serialize("bench", CryptoDtoMode::ChaCha20Poly1305, &KEY, sequence, &dto).unwrap()
            })
        });

        let sealed = serialize("bench", CryptoDtoMode::ChaCha20Poly1305, &KEY, 1, &dto).unwrap();
        group.bench_function(format!("deserialize_{size}b"), |b| {
            b.iter(|| {
                let de = deserialize_with_key(&KEY, &sealed).unwrap();
                de.get_dto::<AudioTx>().unwrap()
            })
        });
    }

    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_channel_receive(c: &mut Criterion) {
    let config = ChannelConfig::generate("bench").unwrap();
    let sender = CryptoDtoChannel::new(&config.mirrored()).unwrap();
    let dto = frame(512);

    c.bench_function("channel_receive_512b", |b| {
        b.iter_batched(
            || {
                let packet = crypto_dto::serialize_with_channel(
                    &sender,
                    CryptoDtoMode::ChaCha20Poly1305,
                    &dto,
                )
                .unwrap();
                (CryptoDtoChannel::new(&config).unwrap(), packet)
            },
            |(receiver, packet)| {
                let de = deserialize(&receiver, &packet, false);
                assert!(de.is_verified());
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_seal_open, bench_channel_receive);
criterion_main!(benches);
