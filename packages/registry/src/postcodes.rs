//! Postcode to municipality mapping.
//!
//! Covers every postcode issued by Íslandspóstur. The municipality names
//! are the ones used in the canonical table, so a postcode lookup yields
//! a value that can be matched directly against the table key.

/// Maps a three digit postcode to its municipality name.
///
/// Returns `None` for unknown postcodes. Surrounding whitespace is
/// ignored.
#[must_use]
pub fn municipality(postcode: &str) -> Option<&'static str> {
    match postcode.trim() {
        "101"
        | "102"
        | "103"
        | "104"
        | "105"
        | "107"
        | "108"
        | "109"
        | "110"
        | "111"
        | "112"
        | "113"
        | "116"
        | "121"
        | "123"
        | "124"
        | "125"
        | "127"
        | "128"
        | "129"
        | "130"
        | "132"
        | "161"
        | "162" => Some("Reykjavík"),
        "170" | "172" => Some("Seltjarnarnes"),
        "190" | "191" => Some("Vogar"),
        "200" | "201" | "202" | "203" | "206" => Some("Kópavogur"),
        "210" | "212" => Some("Garðabær"),
        "220" | "221" | "222" => Some("Hafnarfjörður"),
        "225" => Some("Garðabær (Álftanes)"),
        "230" | "232" | "233" | "260" | "262" => Some("Reykjanesbær"),
        "235" => Some("Keflavíkurflugvöllur"),
        "240" | "241" => Some("Grindavík"),
        "245" | "246" => Some("Sandgerði"),
        "250" | "251" => Some("Garður"),
        "270" | "271" | "276" => Some("Mosfellsbær"),
        "300" | "301" | "302" => Some("Akranes"),
        "310" | "311" => Some("Borgarnes"),
        "320" => Some("Reykholt í Borgarfirði"),
        "340" | "341" | "342" => Some("Stykkishólmur"),
        "345" => Some("Flatey á Breiðafirði"),
        "350" | "351" => Some("Grundarfjörður"),
        "355" => Some("Ólafsvík"),
        "356" => Some("Snæfellsbær"),
        "360" => Some("Hellissandur"),
        "370" | "371" => Some("Búðardalur"),
        "380" | "381" => Some("Reykhólahreppur"),
        "400" | "401" => Some("Ísafjörður"),
        "410" => Some("Hnífsdalur"),
        "415" | "416" => Some("Bolungarvík"),
        "420" | "421" => Some("Súðavík"),
        "425" | "426" => Some("Flateyri"),
        "430" | "431" => Some("Suðureyri"),
        "450" | "451" => Some("Patreksfjörður"),
        "460" | "461" => Some("Tálknafjörður"),
        "465" | "466" => Some("Bíldudalur"),
        "470" | "471" => Some("Þingeyri"),
        "500" => Some("Staður"),
        "510" | "511" | "512" => Some("Hólmavík"),
        "520" => Some("Drangsnes"),
        "524" => Some("Árneshreppur"),
        "530" | "531" => Some("Hvammstangi"),
        "540" | "541" => Some("Blönduós"),
        "545" | "546" => Some("Skagaströnd"),
        "550" | "551" => Some("Sauðárkrókur"),
        "560" | "561" => Some("Varmahlíð"),
        "565" | "566" => Some("Hofsós"),
        "570" => Some("Fljótum"),
        "580" | "581" => Some("Siglufjörður"),
        "600" | "601" | "602" | "603" | "604" | "605" | "606" | "607" => Some("Akureyri"),
        "610" | "616" => Some("Grenivík"),
        "611" => Some("Grímsey"),
        "620" | "621" => Some("Dalvík"),
        "625" | "626" => Some("Ólafsfjörður"),
        "630" => Some("Hrísey"),
        "640" | "641" => Some("Húsavík"),
        "645" => Some("Fosshólli"),
        "650" => Some("Laugar"),
        "660" => Some("Mývatn"),
        "670" | "671" => Some("Kópasker"),
        "675" | "676" => Some("Raufarhöfn"),
        "680" | "681" => Some("Þórshöfn"),
        "685" | "686" => Some("Bakkafjörður"),
        "690" | "691" => Some("Vopnafjörður"),
        "700" | "701" => Some("Egilsstöðir"),
        "710" | "711" => Some("Seyðisfjörður"),
        "715" => Some("Mjóifjörður"),
        "720" | "721" => Some("Borgarfjörður (eystri)"),
        "730" | "731" => Some("Reyðarfjörður"),
        "735" | "736" => Some("Eskifjörður"),
        "740" | "741" => Some("Neskaupstaður"),
        "750" | "751" => Some("Fáskrúðsfjörður"),
        "755" | "756" => Some("Stöðvarfjörður"),
        "760" | "761" => Some("Breiðdalsvík"),
        "765" | "766" => Some("Djúpavogur"),
        "780" | "781" => Some("Höfn í Hornafirði"),
        "785" => Some("Öræfum"),
        "800" | "801" | "802" | "803" | "804" | "805" | "806" => Some("Selfoss"),
        "810" => Some("Hveragerði"),
        "815" => Some("Þorlákshöfn"),
        "816" => Some("Ölfus"),
        "820" => Some("Eyrarbakki"),
        "825" => Some("Stokkseyri"),
        "840" => Some("Laugarvatn"),
        "845" | "846" => Some("Flúðir"),
        "850" | "851" => Some("Hella"),
        "860" | "861" => Some("Hvolsvöllur"),
        "870" | "871" => Some("Vík"),
        "880" | "881" => Some("Kirkjubæjarklaustur"),
        "900" | "902" => Some("Vestmannaeyjar"),
        _ => None,
    }
}

/// Same as [`municipality`], for numeric postcodes.
#[must_use]
pub fn municipality_for_code(postcode: u16) -> Option<&'static str> {
    municipality(&postcode.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_reykjavik_postcodes() {
        assert_eq!(municipality("101"), Some("Reykjavík"));
        assert_eq!(municipality("112"), Some("Reykjavík"));
        assert_eq!(municipality(" 162 "), Some("Reykjavík"));
    }

    #[test]
    fn maps_alftanes_separately_from_gardabaer() {
        assert_eq!(municipality("210"), Some("Garðabær"));
        assert_eq!(municipality("225"), Some("Garðabær (Álftanes)"));
    }

    #[test]
    fn maps_numeric_postcodes() {
        assert_eq!(municipality_for_code(600), Some("Akureyri"));
        assert_eq!(municipality_for_code(900), Some("Vestmannaeyjar"));
    }

    #[test]
    fn unknown_postcodes_map_to_none() {
        assert_eq!(municipality("999"), None);
        assert_eq!(municipality(""), None);
        assert_eq!(municipality_for_code(0), None);
    }
}
