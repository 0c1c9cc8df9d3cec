use std::fs;
use std::net::TcpListener;
use std::thread;

use netlab::rrpc::{client, server, RrpcClientConfig};

/// §8.1 law 8 / §8.2 scenario 6: reversing "HelloWorld" chunked with
/// Lmin=Lmax=3 must equal the whole-file reversal.
#[test]
fn hello_world_reverses_via_chunked_rpc() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || server::run_on(listener).unwrap());

    let dir = std::env::temp_dir().join(format!("netlab-rrpc-test-{port}"));
    fs::create_dir_all(&dir).unwrap();
    let input_path = dir.join("input.txt");
    fs::write(&input_path, b"HelloWorld").unwrap();

    let config = RrpcClientConfig {
        host: "127.0.0.1".to_string(),
        port,
        l_min: 3,
        l_max: 3,
        input_file: input_path,
    };

    let output_path = client::run(&config).unwrap();
    let output = fs::read_to_string(&output_path).unwrap();
    assert_eq!(output, "dlroWolleH");
}

/// A larger, uneven input exercises the `min(random(Lmin,Lmax), remaining)`
/// chunking policy end-to-end, not just the textbook example.
#[test]
fn arbitrary_ascii_file_reverses_correctly() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || server::run_on(listener).unwrap());

    let dir = std::env::temp_dir().join(format!("netlab-rrpc-test2-{port}"));
    fs::create_dir_all(&dir).unwrap();
    let input_path = dir.join("input.txt");
    let contents: String = (0..237).map(|i| (b'a' + (i % 26) as u8) as char).collect();
    fs::write(&input_path, &contents).unwrap();

    let config = RrpcClientConfig {
        host: "127.0.0.1".to_string(),
        port,
        l_min: 17,
        l_max: 41,
        input_file: input_path,
    };

    let output_path = client::run(&config).unwrap();
    let output = fs::read_to_string(&output_path).unwrap();
    let expected: String = contents.chars().rev().collect();
    assert_eq!(output, expected);
}
