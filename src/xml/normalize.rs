//! NFe/CTe normalization.
//!
//! `normalize` is a pure function from an XML string to a
//! [`FiscalDocument`]. Only three conditions are fatal: malformed XML,
//! a document that is neither NFe nor CTe, and an NFe without its
//! mandatory `infNFe` block. Everything else degrades: each section is
//! extracted in isolation and a missing sub-block yields an all-empty
//! sub-record instead of failing the document.

use crate::core::{
    AdditionalInfo, Billing, Carrier, CofinsDetail, DocumentType, Environment, FiscalDocument,
    FiscalError, IcmsDetail, Identification, Installment, InvoiceRef, IpiDetail, LineItem,
    LineTaxes, Party, Payment, Payments, PisDetail, Protocol, TaxId, TaxStatus, Totals, Transport,
    Vehicle, Volume, is_access_key_well_formed,
};

use super::dom::{Element, XmlTree};
use super::extract::{child_of, date_of, datetime_of, decimal_of, text_of};

/// Normalize a raw XML string into the canonical document model.
///
/// # Errors
///
/// [`FiscalError::Parse`] for malformed XML,
/// [`FiscalError::UnrecognizedDocumentType`] when neither `infNFe` nor
/// `infCte` is present, and [`FiscalError::MissingRequiredStructure`]
/// when a document claims to be an NFe but lacks its info block.
pub fn normalize(xml: &str) -> Result<FiscalDocument, FiscalError> {
    let tree = XmlTree::parse(xml)?;
    if tree.descendant("infNFe").is_some() {
        normalize_nfe(&tree)
    } else if tree.descendant("infCte").is_some() {
        Ok(normalize_cte(&tree))
    } else {
        Err(FiscalError::UnrecognizedDocumentType)
    }
}

fn normalize_nfe(tree: &XmlTree) -> Result<FiscalDocument, FiscalError> {
    let nfe = tree
        .descendant("NFe")
        .ok_or(FiscalError::MissingRequiredStructure("NFe"))?;
    let inf = nfe
        .descendant("infNFe")
        .ok_or(FiscalError::MissingRequiredStructure("infNFe"))?;

    let ide = inf.descendant("ide");
    let emit = inf.descendant("emit");
    let dest = inf.descendant("dest");
    let icms_tot = child_of(inf.descendant("total"), "ICMSTot");
    let transp = inf.descendant("transp");
    let cobr = inf.descendant("cobr");
    let pag = inf.descendant("pag");
    let inf_adic = inf.descendant("infAdic");
    // The protocol lives outside <NFe>, under <protNFe> of the procNFe
    // envelope; search the whole tree.
    let inf_prot = tree.descendant("infProt");

    let access_key = text_of(inf_prot, "chNFe")
        .or_else(|| access_key_from_id(inf, "NFe"))
        .filter(|k| is_access_key_well_formed(k));

    let mut document = FiscalDocument::new(DocumentType::Nfe);
    document.identification = extract_identification(ide, access_key);
    document.issuer = extract_party(emit, "enderEmit");
    document.recipient = extract_party(dest, "enderDest");
    document.line_items = extract_line_items(inf);
    document.totals = extract_totals(icms_tot);
    document.transport = extract_transport(transp);
    document.billing = extract_billing(cobr);
    document.payments = extract_payments(pag);
    document.additional_info = AdditionalInfo {
        complement: text_of(inf_adic, "infCpl"),
        fisco: text_of(inf_adic, "infAdFisco"),
    };
    document.protocol = inf_prot.map(extract_protocol);
    Ok(document)
}

/// Reduced CTe extraction: identity of the two parties plus whatever
/// identification is trivially at hand. Intentionally minimal.
fn normalize_cte(tree: &XmlTree) -> FiscalDocument {
    let inf = tree.descendant("infCte");
    let ide = child_of(inf, "ide");
    let emit = tree.descendant("emit");
    let dest = tree.descendant("dest");

    let access_key = text_of(tree.descendant("infProt"), "chCTe")
        .or_else(|| inf.and_then(|el| access_key_from_id(el, "CTe")))
        .filter(|k| is_access_key_well_formed(k));

    let mut document = FiscalDocument::new(DocumentType::Cte);
    document.identification.access_key = access_key;
    document.identification.number = text_of(ide, "nCT");
    document.identification.series = text_of(ide, "serie");
    document.identification.issued_at = datetime_of(ide, "dhEmi");
    document.issuer = Party {
        tax_id: tax_id_of(emit),
        legal_name: text_of(emit, "xNome"),
        ..Party::default()
    };
    document.recipient = Party {
        tax_id: tax_id_of(dest),
        legal_name: text_of(dest, "xNome"),
        ..Party::default()
    };
    document
}

/// `Id="NFe3520..."` → the 44 digits after the type prefix.
fn access_key_from_id(inf: &Element, prefix: &str) -> Option<String> {
    let id = inf.attribute("Id")?;
    Some(id.strip_prefix(prefix).unwrap_or(id).to_string())
}

fn tax_id_of(node: Option<&Element>) -> Option<TaxId> {
    text_of(node, "CNPJ")
        .map(TaxId::Cnpj)
        .or_else(|| text_of(node, "CPF").map(TaxId::Cpf))
}

fn extract_identification(ide: Option<&Element>, access_key: Option<String>) -> Identification {
    Identification {
        access_key,
        number: text_of(ide, "nNF"),
        series: text_of(ide, "serie"),
        model: text_of(ide, "mod"),
        issued_at: datetime_of(ide, "dhEmi"),
        departed_at: datetime_of(ide, "dhSaiEnt"),
        operation_nature: text_of(ide, "natOp"),
        operation_type: text_of(ide, "tpNF"),
        environment: text_of(ide, "tpAmb")
            .map(|c| Environment::from_code(&c))
            .unwrap_or_default(),
        state_code: text_of(ide, "cUF"),
        municipality_code: text_of(ide, "cMunFG"),
        purpose: text_of(ide, "finNFe"),
    }
}

fn extract_party(node: Option<&Element>, address_tag: &str) -> Party {
    let address = child_of(node, address_tag);
    Party {
        tax_id: tax_id_of(node),
        legal_name: text_of(node, "xNome"),
        trade_name: text_of(node, "xFant"),
        state_registration: text_of(node, "IE"),
        tax_regime: text_of(node, "CRT"),
        address: crate::core::Address {
            street: text_of(address, "xLgr"),
            number: text_of(address, "nro"),
            district: text_of(address, "xBairro"),
            municipality_code: text_of(address, "cMun"),
            municipality: text_of(address, "xMun"),
            state: text_of(address, "UF"),
            postal_code: text_of(address, "CEP"),
            country: text_of(address, "xPais"),
            phone: text_of(address, "fone"),
        },
    }
}

fn extract_line_items(inf: &Element) -> Vec<LineItem> {
    let mut dets = Vec::new();
    inf.descendants("det", &mut dets);
    dets.into_iter().map(extract_line_item).collect()
}

fn extract_line_item(det: &Element) -> LineItem {
    let prod = det.descendant("prod");
    let imposto = det.descendant("imposto");
    LineItem {
        number: det.attribute("nItem").and_then(|n| n.trim().parse().ok()),
        code: text_of(prod, "cProd"),
        ean: text_of(prod, "cEAN"),
        description: text_of(prod, "xProd"),
        ncm: text_of(prod, "NCM"),
        cfop: text_of(prod, "CFOP"),
        unit: text_of(prod, "uCom"),
        quantity: decimal_of(prod, "qCom"),
        unit_value: decimal_of(prod, "vUnCom"),
        total: decimal_of(prod, "vProd"),
        discount: decimal_of(prod, "vDesc"),
        additional_info: text_of(Some(det), "infAdProd"),
        taxes: extract_line_taxes(imposto),
    }
}

fn extract_line_taxes(imposto: Option<&Element>) -> LineTaxes {
    LineTaxes {
        total_tax: decimal_of(imposto, "vTotTrib"),
        icms: resolve_icms(imposto),
        ipi: resolve_ipi(imposto),
        pis: resolve_pis(imposto),
        cofins: resolve_cofins(imposto),
    }
}

/// Pick the first `ICMS*` variant child of the `ICMS` wrapper and extract
/// the uniform field set. The CST-vs-CSOSN split is decided here: a CST
/// wins when present, otherwise a CSOSN; never both.
fn resolve_icms(imposto: Option<&Element>) -> Option<IcmsDetail> {
    let wrapper = child_of(imposto, "ICMS")?;
    let variant = wrapper
        .children()
        .iter()
        .find(|c| c.name().starts_with("ICMS"))?;
    let node = Some(variant);
    let status = text_of(node, "CST")
        .map(TaxStatus::Cst)
        .or_else(|| text_of(node, "CSOSN").map(TaxStatus::Csosn));
    Some(IcmsDetail {
        variant: variant.name().to_string(),
        origin: text_of(node, "orig"),
        status,
        base_modality: text_of(node, "modBC"),
        base: decimal_of(node, "vBC"),
        rate: decimal_of(node, "pICMS"),
        value: decimal_of(node, "vICMS"),
    })
}

fn first_variant<'a>(wrapper: &'a Element, names: &[&str]) -> Option<&'a Element> {
    wrapper
        .children()
        .iter()
        .find(|c| names.contains(&c.name()))
}

fn resolve_ipi(imposto: Option<&Element>) -> Option<IpiDetail> {
    let wrapper = child_of(imposto, "IPI")?;
    let node = Some(first_variant(wrapper, &["IPITrib", "IPINT"])?);
    Some(IpiDetail {
        cst: text_of(node, "CST"),
        base: decimal_of(node, "vBC"),
        rate: decimal_of(node, "pIPI"),
        value: decimal_of(node, "vIPI"),
    })
}

fn resolve_pis(imposto: Option<&Element>) -> Option<PisDetail> {
    let wrapper = child_of(imposto, "PIS")?;
    let node = Some(first_variant(
        wrapper,
        &["PISAliq", "PISQtde", "PISNT", "PISOutr"],
    )?);
    Some(PisDetail {
        cst: text_of(node, "CST"),
        base: decimal_of(node, "vBC"),
        rate: decimal_of(node, "pPIS"),
        value: decimal_of(node, "vPIS"),
    })
}

fn resolve_cofins(imposto: Option<&Element>) -> Option<CofinsDetail> {
    let wrapper = child_of(imposto, "COFINS")?;
    let node = Some(first_variant(
        wrapper,
        &["COFINSAliq", "COFINSQtde", "COFINSNT", "COFINSOutr"],
    )?);
    Some(CofinsDetail {
        cst: text_of(node, "CST"),
        base: decimal_of(node, "vBC"),
        rate: decimal_of(node, "pCOFINS"),
        value: decimal_of(node, "vCOFINS"),
    })
}

fn extract_totals(icms_tot: Option<&Element>) -> Totals {
    Totals {
        tax_base: decimal_of(icms_tot, "vBC"),
        tax_value: decimal_of(icms_tot, "vICMS"),
        st_base: decimal_of(icms_tot, "vBCST"),
        st_value: decimal_of(icms_tot, "vST"),
        products_value: decimal_of(icms_tot, "vProd"),
        freight: decimal_of(icms_tot, "vFrete"),
        insurance: decimal_of(icms_tot, "vSeg"),
        discount: decimal_of(icms_tot, "vDesc"),
        ipi_value: decimal_of(icms_tot, "vIPI"),
        pis_value: decimal_of(icms_tot, "vPIS"),
        cofins_value: decimal_of(icms_tot, "vCOFINS"),
        other_expenses: decimal_of(icms_tot, "vOutro"),
        grand_total: decimal_of(icms_tot, "vNF"),
    }
}

fn extract_transport(transp: Option<&Element>) -> Transport {
    let carrier = child_of(transp, "transporta");
    let vehicle = child_of(transp, "veicTransp");
    let mut vols = Vec::new();
    if let Some(t) = transp {
        t.descendants("vol", &mut vols);
    }
    Transport {
        freight_mode: text_of(transp, "modFrete"),
        carrier: Carrier {
            tax_id: tax_id_of(carrier),
            name: text_of(carrier, "xNome"),
            state_registration: text_of(carrier, "IE"),
            address: text_of(carrier, "xEnder"),
            municipality: text_of(carrier, "xMun"),
            state: text_of(carrier, "UF"),
        },
        vehicle: Vehicle {
            plate: text_of(vehicle, "placa"),
            state: text_of(vehicle, "UF"),
            rntc: text_of(vehicle, "RNTC"),
        },
        volumes: vols
            .into_iter()
            .map(|v| {
                let v = Some(v);
                Volume {
                    quantity: decimal_of(v, "qVol"),
                    kind: text_of(v, "esp"),
                    brand: text_of(v, "marca"),
                    numbering: text_of(v, "nVol"),
                    net_weight: decimal_of(v, "pesoL"),
                    gross_weight: decimal_of(v, "pesoB"),
                }
            })
            .collect(),
    }
}

fn extract_billing(cobr: Option<&Element>) -> Billing {
    let fat = child_of(cobr, "fat");
    let mut dups = Vec::new();
    if let Some(c) = cobr {
        c.descendants("dup", &mut dups);
    }
    Billing {
        invoice: fat.map(|f| {
            let f = Some(f);
            InvoiceRef {
                number: text_of(f, "nFat"),
                original_value: decimal_of(f, "vOrig"),
                discount: decimal_of(f, "vDesc"),
                net_value: decimal_of(f, "vLiq"),
            }
        }),
        installments: dups
            .into_iter()
            .map(|d| {
                let d = Some(d);
                Installment {
                    number: text_of(d, "nDup"),
                    due_date: date_of(d, "dVenc"),
                    value: decimal_of(d, "vDup"),
                }
            })
            .collect(),
    }
}

fn extract_payments(pag: Option<&Element>) -> Payments {
    let mut det_pags = Vec::new();
    if let Some(p) = pag {
        p.descendants("detPag", &mut det_pags);
    }
    Payments {
        entries: det_pags
            .into_iter()
            .map(|p| {
                let p = Some(p);
                Payment {
                    method: text_of(p, "tPag"),
                    value: decimal_of(p, "vPag"),
                }
            })
            .collect(),
        change: decimal_of(pag, "vTroco"),
    }
}

fn extract_protocol(inf_prot: &Element) -> Protocol {
    let node = Some(inf_prot);
    Protocol {
        access_key: text_of(node, "chNFe"),
        received_at: datetime_of(node, "dhRecbto"),
        number: text_of(node, "nProt"),
        status_code: text_of(node, "cStat"),
        status_reason: text_of(node, "xMotivo"),
        environment: text_of(node, "tpAmb")
            .map(|c| Environment::from_code(&c))
            .unwrap_or_default(),
        application_version: text_of(node, "verAplic"),
        digest: text_of(node, "digVal"),
    }
}
