//! サーバービルドスクリプト

use chrono::Utc;

fn main() {
    // ビルド番号をタイムスタンプ形式（YYMMDDHHmmss）で生成
    let build_number = Utc::now().format("%y%m%d%H%M%S").to_string();
    println!("cargo:rustc-env=BUILD_NUMBER={}", build_number);

    // 再ビルドのトリガー
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=BUILD_NUMBER");
}
