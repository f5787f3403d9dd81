use criterion::{Criterion, black_box, criterion_group, criterion_main};

use notafiscal::report::{ReportModel, flatten};
use notafiscal::xml::normalize;

fn sample_nfe(items: usize) -> String {
    let mut dets = String::new();
    for i in 1..=items {
        dets.push_str(&format!(
            "<det nItem=\"{i}\"><prod><cProd>P{i}</cProd><xProd>PRODUTO {i}</xProd>\
             <NCM>73181500</NCM><CFOP>5102</CFOP><uCom>UN</uCom><qCom>1</qCom>\
             <vUnCom>10.00</vUnCom><vProd>10.00</vProd></prod>\
             <imposto><ICMS><ICMS00><orig>0</orig><CST>00</CST><vBC>10.00</vBC>\
             <pICMS>18.00</pICMS><vICMS>1.80</vICMS></ICMS00></ICMS></imposto></det>"
        ));
    }
    format!(
        "<nfeProc><NFe><infNFe Id=\"NFe35240814200166000187550010000012341000012345\">\
         <ide><nNF>1</nNF><serie>1</serie><natOp>VENDA</natOp>\
         <dhEmi>2024-08-15T10:30:00-03:00</dhEmi></ide>\
         <emit><CNPJ>14200166000187</CNPJ><xNome>ACME LTDA</xNome></emit>\
         <dest><CPF>52998224725</CPF><xNome>CLIENTE</xNome></dest>\
         {dets}\
         <total><ICMSTot><vProd>100.00</vProd><vNF>100.00</vNF></ICMSTot></total>\
         </infNFe></NFe></nfeProc>"
    )
}

fn bench_normalize(c: &mut Criterion) {
    let small = sample_nfe(3);
    let large = sample_nfe(200);

    c.bench_function("normalize_3_items", |b| {
        b.iter(|| normalize(black_box(&small)).unwrap())
    });
    c.bench_function("normalize_200_items", |b| {
        b.iter(|| normalize(black_box(&large)).unwrap())
    });
}

fn bench_flatten(c: &mut Criterion) {
    let xml = sample_nfe(10);
    let docs: Vec<_> = (0..100).map(|_| normalize(&xml).unwrap()).collect();

    c.bench_function("flatten_100_docs_exploded", |b| {
        b.iter(|| flatten(black_box(&docs), &ReportModel::NfeProducts))
    });
}

criterion_group!(benches, bench_normalize, bench_flatten);
criterion_main!(benches);
